//! Client for the external product catalog service.
//!
//! The catalog owns product records and the inventory counter. Every
//! stock change is pushed back through this client; there is no local
//! cache of truth. Remote failures surface as [`CatalogError::Unavailable`]
//! and are never collapsed into "product not found" — callers rely on the
//! distinction to avoid masking stock or price errors.

use async_trait::async_trait;
use thiserror::Error;

use salespoint_core::domain::product::{Product, ProductDraft, ProductId};

pub mod http;
pub mod memory;

pub use http::HttpProductCatalog;
pub use memory::InMemoryProductCatalog;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("product not found in catalog: {0}")]
    NotFound(ProductId),
    #[error("catalog unavailable: {0}")]
    Unavailable(String),
}

/// Synchronous request/response gateway to the catalog. Calls block the
/// enclosing operation; there is no fire-and-forget path.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn get_by_id(&self, id: &ProductId) -> Result<Product, CatalogError>;
    async fn get_by_id_include_inactive(&self, id: &ProductId) -> Result<Product, CatalogError>;
    /// Push a full product representation with an updated inventory field.
    async fn set_inventory(&self, product: &Product) -> Result<(), CatalogError>;
    async fn create(&self, draft: ProductDraft) -> Result<Product, CatalogError>;
    async fn delete(&self, id: &ProductId) -> Result<(), CatalogError>;
    async fn get_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, CatalogError>;
}
