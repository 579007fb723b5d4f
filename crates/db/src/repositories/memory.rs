use std::collections::HashMap;

use tokio::sync::RwLock;

use salespoint_core::domain::campaign::{Campaign, CampaignId};
use salespoint_core::domain::inventory::{InventoryOp, OperationKey};
use salespoint_core::domain::product::{Product, ProductId};
use salespoint_core::domain::sale::{Sale, SaleId, SoldLine, SoldLineId};

use super::{
    CampaignRepository, InventoryOpRepository, ProductRepository, RepositoryError, SaleRepository,
    SoldLineRepository,
};

#[derive(Default)]
pub struct InMemoryCampaignRepository {
    campaigns: RwLock<HashMap<String, Campaign>>,
}

#[async_trait::async_trait]
impl CampaignRepository for InMemoryCampaignRepository {
    async fn find_by_id(&self, id: &CampaignId) -> Result<Option<Campaign>, RepositoryError> {
        let campaigns = self.campaigns.read().await;
        Ok(campaigns.get(&id.0).filter(|campaign| !campaign.deleted).cloned())
    }

    async fn find_all_active(&self) -> Result<Vec<Campaign>, RepositoryError> {
        let campaigns = self.campaigns.read().await;
        Ok(campaigns.values().filter(|campaign| !campaign.deleted).cloned().collect())
    }

    async fn find_active_by_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Campaign>, RepositoryError> {
        let campaigns = self.campaigns.read().await;
        Ok(campaigns
            .values()
            .filter(|campaign| !campaign.deleted && campaign.contains(product_id))
            .cloned()
            .collect())
    }

    async fn active_name_exists(
        &self,
        name: &str,
        excluding: Option<&CampaignId>,
    ) -> Result<bool, RepositoryError> {
        let campaigns = self.campaigns.read().await;
        Ok(campaigns.values().any(|campaign| {
            !campaign.deleted
                && campaign.name == name
                && excluding.map_or(true, |excluded| &campaign.id != excluded)
        }))
    }

    async fn save(&self, campaign: Campaign) -> Result<(), RepositoryError> {
        let mut campaigns = self.campaigns.write().await;
        campaigns.insert(campaign.id.0.clone(), campaign);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySaleRepository {
    sales: RwLock<HashMap<String, Sale>>,
}

#[async_trait::async_trait]
impl SaleRepository for InMemorySaleRepository {
    async fn find_by_id(&self, id: &SaleId) -> Result<Option<Sale>, RepositoryError> {
        let sales = self.sales.read().await;
        Ok(sales.get(&id.0).cloned())
    }

    async fn save(&self, sale: Sale) -> Result<(), RepositoryError> {
        let mut sales = self.sales.write().await;
        sales.insert(sale.id.0.clone(), sale);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemorySoldLineRepository {
    lines: RwLock<HashMap<String, SoldLine>>,
}

#[async_trait::async_trait]
impl SoldLineRepository for InMemorySoldLineRepository {
    async fn find_active_by_id(
        &self,
        id: &SoldLineId,
    ) -> Result<Option<SoldLine>, RepositoryError> {
        let lines = self.lines.read().await;
        Ok(lines.get(&id.0).filter(|line| !line.deleted).cloned())
    }

    async fn find_active(
        &self,
        sale_id: &SaleId,
        product_id: &ProductId,
    ) -> Result<Option<SoldLine>, RepositoryError> {
        let lines = self.lines.read().await;
        Ok(lines
            .values()
            .find(|line| {
                !line.deleted && &line.sale_id == sale_id && &line.product_id == product_id
            })
            .cloned())
    }

    async fn find_active_by_sale(
        &self,
        sale_id: &SaleId,
    ) -> Result<Vec<SoldLine>, RepositoryError> {
        let lines = self.lines.read().await;
        Ok(lines
            .values()
            .filter(|line| !line.deleted && &line.sale_id == sale_id)
            .cloned()
            .collect())
    }

    async fn save(&self, line: SoldLine) -> Result<(), RepositoryError> {
        let mut lines = self.lines.write().await;
        lines.insert(line.id.0.clone(), line);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<HashMap<String, Product>>,
}

#[async_trait::async_trait]
impl ProductRepository for InMemoryProductRepository {
    async fn find_active_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).filter(|product| product.active).cloned())
    }

    async fn find_by_id_include_inactive(
        &self,
        id: &ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(products.get(&id.0).cloned())
    }

    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let products = self.products.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| products.get(&id.0).filter(|product| product.active).cloned())
            .collect())
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        let mut products = self.products.write().await;
        products.insert(product.id.0.clone(), product);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryInventoryOpRepository {
    ops: RwLock<HashMap<String, InventoryOp>>,
}

#[async_trait::async_trait]
impl InventoryOpRepository for InMemoryInventoryOpRepository {
    async fn find(&self, key: &OperationKey) -> Result<Option<InventoryOp>, RepositoryError> {
        let ops = self.ops.read().await;
        Ok(ops.get(&key.0).cloned())
    }

    async fn record(&self, op: InventoryOp) -> Result<(), RepositoryError> {
        let mut ops = self.ops.write().await;
        if ops.contains_key(&op.key.0) {
            return Err(RepositoryError::Conflict(format!(
                "inventory op `{}` already recorded",
                op.key
            )));
        }
        ops.insert(op.key.0.clone(), op);
        Ok(())
    }
}
