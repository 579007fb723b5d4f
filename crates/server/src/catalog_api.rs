//! Catalog-side REST surface for products. Paths are the wire contract
//! the catalog client depends on and must not be renamed.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tracing::{error, info};

use salespoint_core::domain::product::{Product, ProductDraft, ProductId};
use salespoint_db::repositories::{ProductRepository, RepositoryError};

#[derive(Clone)]
pub struct CatalogApiState {
    products: Arc<dyn ProductRepository>,
}

pub fn router(products: Arc<dyn ProductRepository>) -> Router {
    Router::new()
        .route("/product/{id}", get(get_product))
        .route("/product/getByIdIncludeInactive/{id}", get(get_product_include_inactive))
        .route("/product/updateInventory/{id}", put(update_inventory))
        .route("/product/add", post(add_product))
        .route("/product/delete/{id}", delete(delete_product))
        .route("/product/getByIds", post(get_products_by_ids))
        .with_state(CatalogApiState { products })
}

enum ApiError {
    NotFound,
    Storage(RepositoryError),
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        Self::Storage(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::Storage(inner) => {
                error!(error = %inner, "catalog storage failure");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Active products only; an inactive product answers 404 just like a
/// missing one.
async fn get_product(
    State(state): State<CatalogApiState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = state.products.find_active_by_id(&ProductId(id)).await?;
    product.map(Json).ok_or(ApiError::NotFound)
}

async fn get_product_include_inactive(
    State(state): State<CatalogApiState>,
    Path(id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = state.products.find_by_id_include_inactive(&ProductId(id)).await?;
    product.map(Json).ok_or(ApiError::NotFound)
}

/// Replaces the stored record with the submitted representation. The
/// path id is authoritative; the body id is ignored.
async fn update_inventory(
    State(state): State<CatalogApiState>,
    Path(id): Path<String>,
    Json(mut incoming): Json<Product>,
) -> Result<Json<Product>, ApiError> {
    let id = ProductId(id);
    if state.products.find_by_id_include_inactive(&id).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    incoming.id = id;
    state.products.save(incoming.clone()).await?;
    info!(product_id = %incoming.id, inventory = incoming.inventory, "product inventory updated");
    Ok(Json(incoming))
}

async fn add_product(
    State(state): State<CatalogApiState>,
    Json(draft): Json<ProductDraft>,
) -> Result<Json<Product>, ApiError> {
    let product = Product {
        id: ProductId::generate(),
        name: draft.name,
        unit_price: draft.unit_price,
        inventory: draft.inventory,
        active: true,
    };
    state.products.save(product.clone()).await?;
    info!(product_id = %product.id, name = %product.name, "product added");
    Ok(Json(product))
}

/// Soft delete: the record stays but drops out of active lookups.
async fn delete_product(
    State(state): State<CatalogApiState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = ProductId(id);
    let mut product =
        state.products.find_by_id_include_inactive(&id).await?.ok_or(ApiError::NotFound)?;

    product.active = false;
    state.products.save(product).await?;
    info!(product_id = %id, "product soft-deleted");
    Ok(StatusCode::OK)
}

/// Bulk lookup. Unknown ids are silently skipped rather than failing the
/// whole batch.
async fn get_products_by_ids(
    State(state): State<CatalogApiState>,
    Json(ids): Json<Vec<ProductId>>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state.products.find_by_ids(&ids).await?;
    Ok(Json(products))
}
