use async_trait::async_trait;
use thiserror::Error;

use salespoint_core::domain::campaign::{Campaign, CampaignId};
use salespoint_core::domain::inventory::{InventoryOp, OperationKey};
use salespoint_core::domain::product::{Product, ProductId};
use salespoint_core::domain::sale::{Sale, SaleId, SoldLine, SoldLineId};

pub mod campaign;
pub mod inventory_op;
pub mod memory;
pub mod product;
pub mod sale;

pub use campaign::SqlCampaignRepository;
pub use inventory_op::SqlInventoryOpRepository;
pub use memory::{
    InMemoryCampaignRepository, InMemoryInventoryOpRepository, InMemoryProductRepository,
    InMemorySaleRepository, InMemorySoldLineRepository,
};
pub use product::SqlProductRepository;
pub use sale::{SqlSaleRepository, SqlSoldLineRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    /// Unique-key violation. Both the SQL and in-memory stores report
    /// duplicate inserts this way.
    #[error("conflict: {0}")]
    Conflict(String),
}

pub(crate) fn decode_decimal(
    raw: &str,
    column: &str,
) -> Result<rust_decimal::Decimal, RepositoryError> {
    raw.parse()
        .map_err(|_| RepositoryError::Decode(format!("invalid decimal in `{column}`: `{raw}`")))
}

pub(crate) fn decode_timestamp(
    raw: &str,
    column: &str,
) -> Result<chrono::DateTime<chrono::Utc>, RepositoryError> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&chrono::Utc))
        .map_err(|_| RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{raw}`")))
}

/// Campaign rows plus their product membership. All queries exclude
/// soft-deleted campaigns.
#[async_trait]
pub trait CampaignRepository: Send + Sync {
    async fn find_by_id(&self, id: &CampaignId) -> Result<Option<Campaign>, RepositoryError>;
    async fn find_all_active(&self) -> Result<Vec<Campaign>, RepositoryError>;
    /// Non-deleted campaigns whose product set contains the given id,
    /// served from the product -> campaign membership index.
    async fn find_active_by_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Vec<Campaign>, RepositoryError>;
    async fn active_name_exists(
        &self,
        name: &str,
        excluding: Option<&CampaignId>,
    ) -> Result<bool, RepositoryError>;
    /// Upserts the campaign row and replaces its membership rows in one
    /// transaction.
    async fn save(&self, campaign: Campaign) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait SaleRepository: Send + Sync {
    async fn find_by_id(&self, id: &SaleId) -> Result<Option<Sale>, RepositoryError>;
    async fn save(&self, sale: Sale) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait SoldLineRepository: Send + Sync {
    /// Active (non-deleted) line by id. Deleted lines are terminal and
    /// invisible to lookups.
    async fn find_active_by_id(&self, id: &SoldLineId)
        -> Result<Option<SoldLine>, RepositoryError>;
    async fn find_active(
        &self,
        sale_id: &SaleId,
        product_id: &ProductId,
    ) -> Result<Option<SoldLine>, RepositoryError>;
    async fn find_active_by_sale(&self, sale_id: &SaleId)
        -> Result<Vec<SoldLine>, RepositoryError>;
    async fn save(&self, line: SoldLine) -> Result<(), RepositoryError>;
}

/// Catalog-service side storage for products.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn find_active_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError>;
    async fn find_by_id_include_inactive(
        &self,
        id: &ProductId,
    ) -> Result<Option<Product>, RepositoryError>;
    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError>;
    async fn save(&self, product: Product) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait InventoryOpRepository: Send + Sync {
    async fn find(&self, key: &OperationKey) -> Result<Option<InventoryOp>, RepositoryError>;
    async fn record(&self, op: InventoryOp) -> Result<(), RepositoryError>;
}
