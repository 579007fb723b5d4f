use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use tracing::warn;

use salespoint_core::config::CatalogConfig;
use salespoint_core::domain::product::{Product, ProductDraft, ProductId};

use crate::{CatalogError, ProductCatalog};

/// Catalog client over the service's REST surface. Paths are part of the
/// wire contract and case-sensitive.
pub struct HttpProductCatalog {
    client: Client,
    base_url: String,
}

impl HttpProductCatalog {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|error| CatalogError::Unavailable(error.to_string()))?;

        Ok(Self { client, base_url: config.base_url.trim_end_matches('/').to_string() })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn decode_product(
        &self,
        response: Response,
        id: &ProductId,
    ) -> Result<Product, CatalogError> {
        if response.status() == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(id.clone()));
        }
        let response = response.error_for_status().map_err(transport)?;
        response.json().await.map_err(transport)
    }
}

fn transport(error: reqwest::Error) -> CatalogError {
    warn!(error = %error, "catalog call failed");
    CatalogError::Unavailable(error.to_string())
}

#[async_trait]
impl ProductCatalog for HttpProductCatalog {
    async fn get_by_id(&self, id: &ProductId) -> Result<Product, CatalogError> {
        let response = self
            .client
            .get(self.url(&format!("product/{id}")))
            .send()
            .await
            .map_err(transport)?;
        self.decode_product(response, id).await
    }

    async fn get_by_id_include_inactive(&self, id: &ProductId) -> Result<Product, CatalogError> {
        let response = self
            .client
            .get(self.url(&format!("product/getByIdIncludeInactive/{id}")))
            .send()
            .await
            .map_err(transport)?;
        self.decode_product(response, id).await
    }

    async fn set_inventory(&self, product: &Product) -> Result<(), CatalogError> {
        let response = self
            .client
            .put(self.url(&format!("product/updateInventory/{}", product.id)))
            .json(product)
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(product.id.clone()));
        }
        response.error_for_status().map_err(transport)?;
        Ok(())
    }

    async fn create(&self, draft: ProductDraft) -> Result<Product, CatalogError> {
        let response = self
            .client
            .post(self.url("product/add"))
            .json(&draft)
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?;
        response.json().await.map_err(transport)
    }

    async fn delete(&self, id: &ProductId) -> Result<(), CatalogError> {
        let response = self
            .client
            .delete(self.url(&format!("product/delete/{id}")))
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(id.clone()));
        }
        response.error_for_status().map_err(transport)?;
        Ok(())
    }

    async fn get_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, CatalogError> {
        let response = self
            .client
            .post(self.url("product/getByIds"))
            .json(&ids)
            .send()
            .await
            .map_err(transport)?
            .error_for_status()
            .map_err(transport)?;
        response.json().await.map_err(transport)
    }
}

#[cfg(test)]
mod tests {
    use salespoint_core::config::CatalogConfig;

    use super::HttpProductCatalog;

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let catalog = HttpProductCatalog::new(&CatalogConfig {
            base_url: "http://catalog:8081/".to_string(),
            timeout_secs: 5,
        })
        .expect("client");

        assert_eq!(catalog.url("product/p1"), "http://catalog:8081/product/p1");
        assert_eq!(
            catalog.url("product/getByIdIncludeInactive/p1"),
            "http://catalog:8081/product/getByIdIncludeInactive/p1"
        );
    }
}
