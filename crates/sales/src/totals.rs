//! Sale total recomputation.

use std::sync::Arc;

use tracing::debug;

use salespoint_core::domain::sale::{Sale, SaleId};
use salespoint_core::pricing::totals_over;
use salespoint_db::repositories::{SaleRepository, SoldLineRepository};

use crate::errors::LedgerError;

/// Recomputes a sale's derived totals from its live active lines and
/// persists them in one update. This service is the only writer of the
/// three totals fields; `Sale` exposes no other way to set them.
pub struct SaleTotalsService {
    sales: Arc<dyn SaleRepository>,
    lines: Arc<dyn SoldLineRepository>,
}

impl SaleTotalsService {
    pub fn new(sales: Arc<dyn SaleRepository>, lines: Arc<dyn SoldLineRepository>) -> Self {
        Self { sales, lines }
    }

    /// Pure function of the current active-line set; safe to call
    /// repeatedly.
    pub async fn recompute(&self, sale_id: &SaleId) -> Result<Sale, LedgerError> {
        let mut sale = self
            .sales
            .find_by_id(sale_id)
            .await?
            .ok_or_else(|| LedgerError::SaleNotFound(sale_id.clone()))?;
        let lines = self.lines.find_active_by_sale(sale_id).await?;

        sale.apply_totals(totals_over(lines.iter()));
        self.sales.save(sale.clone()).await?;

        debug!(%sale_id, total = %sale.total_price(), "sale totals recomputed");
        Ok(sale)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use salespoint_core::domain::product::ProductId;
    use salespoint_core::domain::sale::{Sale, SoldLine};
    use salespoint_db::repositories::{
        InMemorySaleRepository, InMemorySoldLineRepository, SaleRepository, SoldLineRepository,
    };

    use super::SaleTotalsService;
    use crate::errors::LedgerError;

    async fn harness() -> (Arc<InMemorySaleRepository>, Arc<InMemorySoldLineRepository>, SaleTotalsService)
    {
        let sales = Arc::new(InMemorySaleRepository::default());
        let lines = Arc::new(InMemorySoldLineRepository::default());
        let service = SaleTotalsService::new(Arc::clone(&sales) as _, Arc::clone(&lines) as _);
        (sales, lines, service)
    }

    #[tokio::test]
    async fn recompute_sums_active_lines_and_skips_deleted_ones() {
        let (sales, lines, service) = harness().await;
        let sale = Sale::open();
        sales.save(sale.clone()).await.expect("save sale");

        lines
            .save(SoldLine::new(
                sale.id.clone(),
                ProductId("p1".to_string()),
                "Widget",
                Decimal::new(100, 0),
                2,
                Some(10),
            ))
            .await
            .expect("save line");
        let mut gone = SoldLine::new(
            sale.id.clone(),
            ProductId("p2".to_string()),
            "Gadget",
            Decimal::new(999, 0),
            1,
            None,
        );
        gone.deleted = true;
        lines.save(gone).await.expect("save deleted line");

        let sale = service.recompute(&sale.id).await.expect("recompute");

        assert_eq!(sale.total_price(), Decimal::new(200, 0));
        assert_eq!(sale.total_discount_amount(), Decimal::new(20, 0));
        assert_eq!(sale.total_discounted_price(), Decimal::new(180, 0));
    }

    #[tokio::test]
    async fn recompute_is_idempotent() {
        let (sales, lines, service) = harness().await;
        let sale = Sale::open();
        sales.save(sale.clone()).await.expect("save sale");
        lines
            .save(SoldLine::new(
                sale.id.clone(),
                ProductId("p1".to_string()),
                "Widget",
                Decimal::new(100, 0),
                3,
                Some(20),
            ))
            .await
            .expect("save line");

        let first = service.recompute(&sale.id).await.expect("first");
        let second = service.recompute(&sale.id).await.expect("second");

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn recompute_of_unknown_sale_fails() {
        let (_sales, _lines, service) = harness().await;

        let error = service
            .recompute(&salespoint_core::SaleId("missing".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(error, LedgerError::SaleNotFound(_)));
    }
}
