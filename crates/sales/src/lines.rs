//! Sold-line ledger: line mutations for a sale, stock reservations, and
//! the totals recomputation that follows every change.
//!
//! Every mutation runs inside the sale's critical section. A line moves
//! absent -> active -> deleted; deletion is one-way. The unit price is
//! snapshotted when the line is first created and never re-read from the
//! catalog afterwards.

use std::sync::Arc;

use tracing::{info, warn};

use salespoint_catalog::ProductCatalog;
use salespoint_core::domain::inventory::OperationKey;
use salespoint_core::domain::product::ProductId;
use salespoint_core::domain::sale::{Sale, SaleId, SoldLine, SoldLineId};
use salespoint_db::repositories::{SaleRepository, SoldLineRepository};

use crate::campaigns::CampaignService;
use crate::errors::LedgerError;
use crate::inventory::InventoryReconciler;
use crate::keyed_lock::KeyedMutex;
use crate::totals::SaleTotalsService;

pub struct SoldLineService {
    sales: Arc<dyn SaleRepository>,
    lines: Arc<dyn SoldLineRepository>,
    catalog: Arc<dyn ProductCatalog>,
    campaigns: Arc<CampaignService>,
    reconciler: Arc<InventoryReconciler>,
    totals: Arc<SaleTotalsService>,
    locks: KeyedMutex,
}

impl SoldLineService {
    pub fn new(
        sales: Arc<dyn SaleRepository>,
        lines: Arc<dyn SoldLineRepository>,
        catalog: Arc<dyn ProductCatalog>,
        campaigns: Arc<CampaignService>,
        reconciler: Arc<InventoryReconciler>,
        totals: Arc<SaleTotalsService>,
    ) -> Self {
        Self { sales, lines, catalog, campaigns, reconciler, totals, locks: KeyedMutex::default() }
    }

    pub async fn open_sale(&self) -> Result<Sale, LedgerError> {
        let sale = Sale::open();
        self.sales.save(sale.clone()).await?;
        info!(sale_id = %sale.id, "sale opened");
        Ok(sale)
    }

    /// Records `quantity` units of a product on the sale. If the product
    /// already has an active line the quantities merge and only the
    /// increment is reserved against the catalog; otherwise a new line is
    /// created with the current catalog price as its snapshot. A stock
    /// shortage aborts before any line change is persisted.
    pub async fn add_or_merge(
        &self,
        sale_id: &SaleId,
        product_id: &ProductId,
        quantity: u32,
        key: &OperationKey,
    ) -> Result<SoldLine, LedgerError> {
        if quantity == 0 {
            return Err(LedgerError::InvalidQuantity);
        }

        let _guard = self.locks.lock(&sale_id.0).await;
        let sale = self
            .sales
            .find_by_id(sale_id)
            .await?
            .ok_or_else(|| LedgerError::SaleNotFound(sale_id.clone()))?;
        let product = self.catalog.get_by_id(product_id).await?;
        let discount = self.campaigns.resolve_discount(product_id).await?;

        let line = match self.lines.find_active(sale_id, product_id).await? {
            Some(mut existing) => {
                existing.quantity += quantity;
                // Reserve the increment only; the prior quantity is
                // already held.
                self.reconciler.apply_delta(product_id, -i64::from(quantity), key).await?;
                existing.reprice(discount);
                self.persist_after_stock_write(existing).await?
            }
            None => {
                self.reconciler.apply_delta(product_id, -i64::from(quantity), key).await?;
                let line = SoldLine::new(
                    sale_id.clone(),
                    product_id.clone(),
                    product.name.clone(),
                    product.unit_price,
                    quantity,
                    discount,
                );
                self.persist_after_stock_write(line).await?
            }
        };

        self.totals.recompute(&sale.id).await?;
        info!(sale_id = %sale.id, %product_id, quantity = line.quantity, "sold line recorded");
        Ok(line)
    }

    /// Replaces the line's quantity. The stock adjustment is one signed
    /// delta (`old - new`) instead of a restore/reserve pair, so there is
    /// no window where the old reservation is released but the new one
    /// not yet taken. The unit price snapshot is kept as-is.
    pub async fn update_quantity(
        &self,
        line_id: &SoldLineId,
        new_quantity: u32,
        key: &OperationKey,
    ) -> Result<SoldLine, LedgerError> {
        if new_quantity == 0 {
            return Err(LedgerError::InvalidQuantity);
        }

        let sale_id = self.sale_of(line_id).await?;
        let _guard = self.locks.lock(&sale_id.0).await;
        let mut line = self
            .lines
            .find_active_by_id(line_id)
            .await?
            .ok_or_else(|| LedgerError::LineNotFound(line_id.clone()))?;

        let delta = i64::from(line.quantity) - i64::from(new_quantity);
        self.reconciler.apply_delta(&line.product_id, delta, key).await?;

        line.quantity = new_quantity;
        let discount = self.campaigns.resolve_discount(&line.product_id).await?;
        line.reprice(discount);
        let line = self.persist_after_stock_write(line).await?;

        self.totals.recompute(&line.sale_id).await?;
        info!(line_id = %line.id, quantity = new_quantity, "sold line quantity updated");
        Ok(line)
    }

    /// Restores the line's reserved stock and flags it deleted. Deleted
    /// lines stay in the collection but drop out of lookups and totals.
    pub async fn delete(
        &self,
        line_id: &SoldLineId,
        key: &OperationKey,
    ) -> Result<SoldLine, LedgerError> {
        let sale_id = self.sale_of(line_id).await?;
        let _guard = self.locks.lock(&sale_id.0).await;
        let mut line = self
            .lines
            .find_active_by_id(line_id)
            .await?
            .ok_or_else(|| LedgerError::LineNotFound(line_id.clone()))?;

        self.reconciler.apply_delta(&line.product_id, i64::from(line.quantity), key).await?;

        line.deleted = true;
        let line = self.persist_after_stock_write(line).await?;

        self.totals.recompute(&line.sale_id).await?;
        info!(line_id = %line.id, "sold line deleted");
        Ok(line)
    }

    /// Sale key lookup before taking the sale's lock. The line is
    /// re-read inside the critical section.
    async fn sale_of(&self, line_id: &SoldLineId) -> Result<SaleId, LedgerError> {
        self.lines
            .find_active_by_id(line_id)
            .await?
            .map(|line| line.sale_id)
            .ok_or_else(|| LedgerError::LineNotFound(line_id.clone()))
    }

    /// Persists a line after its stock delta was already pushed to the
    /// catalog. A storage failure here cannot be rolled back remotely, so
    /// it surfaces as `PartialReconciliation` rather than a plain
    /// repository error.
    async fn persist_after_stock_write(&self, line: SoldLine) -> Result<SoldLine, LedgerError> {
        match self.lines.save(line.clone()).await {
            Ok(()) => Ok(line),
            Err(error) => {
                warn!(line_id = %line.id, %error, "line save failed after catalog write");
                Err(LedgerError::PartialReconciliation {
                    product_id: line.product_id.clone(),
                    detail: format!("stock delta committed but line save failed: {error}"),
                })
            }
        }
    }
}
