use thiserror::Error;

use salespoint_catalog::CatalogError;
use salespoint_core::domain::campaign::CampaignId;
use salespoint_core::domain::inventory::OperationKey;
use salespoint_core::domain::product::ProductId;
use salespoint_core::domain::sale::{SaleId, SoldLineId};
use salespoint_db::repositories::RepositoryError;

#[derive(Debug, Error)]
pub enum CampaignError {
    #[error("campaign not found: {0}")]
    NotFound(CampaignId),
    #[error("campaign with this name already exists: {0}")]
    AlreadyExists(String),
    #[error("products already in another campaign: {0:?}")]
    ProductsAlreadyClaimed(Vec<ProductId>),
    #[error("products not found in campaign: {0:?}")]
    ProductsNotAssigned(Vec<ProductId>),
    #[error("no products to remove in campaign: {0}")]
    NoProductsAssigned(CampaignId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("sale not found: {0}")]
    SaleNotFound(SaleId),
    #[error("sold line not found: {0}")]
    LineNotFound(SoldLineId),
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),
    #[error("quantity must be positive")]
    InvalidQuantity,
    #[error("not enough stock for product `{name}`: requested {requested}, available {available}")]
    InsufficientStock { product_id: ProductId, name: String, requested: i64, available: i64 },
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),
    #[error("operation key `{0}` was already used for a different stock delta")]
    DuplicateOperation(OperationKey),
    /// The catalog write committed but local bookkeeping did not. Surfaced
    /// distinctly so operators can reconcile the counter by hand.
    #[error("inventory delta for product {product_id} committed but not reconciled locally: {detail}")]
    PartialReconciliation { product_id: ProductId, detail: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<CatalogError> for LedgerError {
    fn from(error: CatalogError) -> Self {
        match error {
            CatalogError::NotFound(id) => Self::ProductNotFound(id),
            CatalogError::Unavailable(detail) => Self::CatalogUnavailable(detail),
        }
    }
}

#[cfg(test)]
mod tests {
    use salespoint_catalog::CatalogError;
    use salespoint_core::domain::product::ProductId;

    use super::LedgerError;

    #[test]
    fn catalog_failure_kinds_stay_distinct() {
        let not_found: LedgerError = CatalogError::NotFound(ProductId("p1".to_string())).into();
        let unavailable: LedgerError =
            CatalogError::Unavailable("connection refused".to_string()).into();

        assert!(matches!(not_found, LedgerError::ProductNotFound(_)));
        assert!(matches!(unavailable, LedgerError::CatalogUnavailable(_)));
    }
}
