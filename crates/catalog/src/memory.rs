use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use salespoint_core::domain::product::{Product, ProductDraft, ProductId};

use crate::{CatalogError, ProductCatalog};

/// In-memory catalog double. `set_offline(true)` makes every call fail
/// with `Unavailable`, which lets tests exercise remote-failure paths.
#[derive(Default)]
pub struct InMemoryProductCatalog {
    products: RwLock<HashMap<String, Product>>,
    offline: AtomicBool,
}

impl InMemoryProductCatalog {
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub async fn put(&self, product: Product) {
        let mut products = self.products.write().await;
        products.insert(product.id.0.clone(), product);
    }

    pub async fn inventory_of(&self, id: &ProductId) -> Option<i64> {
        let products = self.products.read().await;
        products.get(&id.0).map(|product| product.inventory)
    }

    fn ensure_online(&self) -> Result<(), CatalogError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(CatalogError::Unavailable("catalog offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl ProductCatalog for InMemoryProductCatalog {
    async fn get_by_id(&self, id: &ProductId) -> Result<Product, CatalogError> {
        self.ensure_online()?;
        let products = self.products.read().await;
        products
            .get(&id.0)
            .filter(|product| product.active)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.clone()))
    }

    async fn get_by_id_include_inactive(&self, id: &ProductId) -> Result<Product, CatalogError> {
        self.ensure_online()?;
        let products = self.products.read().await;
        products.get(&id.0).cloned().ok_or_else(|| CatalogError::NotFound(id.clone()))
    }

    async fn set_inventory(&self, product: &Product) -> Result<(), CatalogError> {
        self.ensure_online()?;
        let mut products = self.products.write().await;
        match products.get_mut(&product.id.0) {
            Some(stored) => {
                stored.inventory = product.inventory;
                Ok(())
            }
            None => Err(CatalogError::NotFound(product.id.clone())),
        }
    }

    async fn create(&self, draft: ProductDraft) -> Result<Product, CatalogError> {
        self.ensure_online()?;
        let product = Product {
            id: ProductId::generate(),
            name: draft.name,
            unit_price: draft.unit_price,
            inventory: draft.inventory,
            active: true,
        };
        let mut products = self.products.write().await;
        products.insert(product.id.0.clone(), product.clone());
        Ok(product)
    }

    async fn delete(&self, id: &ProductId) -> Result<(), CatalogError> {
        self.ensure_online()?;
        let mut products = self.products.write().await;
        match products.get_mut(&id.0) {
            Some(product) => {
                product.active = false;
                Ok(())
            }
            None => Err(CatalogError::NotFound(id.clone())),
        }
    }

    async fn get_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, CatalogError> {
        self.ensure_online()?;
        let products = self.products.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| products.get(&id.0).filter(|product| product.active).cloned())
            .collect())
    }
}
