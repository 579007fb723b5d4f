use sqlx::{sqlite::SqliteRow, Row};

use salespoint_core::domain::product::ProductId;
use salespoint_core::domain::sale::{Sale, SaleId, SoldLine, SoldLineId};
use salespoint_core::pricing::SaleTotals;

use super::{decode_decimal, decode_timestamp, RepositoryError, SaleRepository, SoldLineRepository};
use crate::DbPool;

pub struct SqlSaleRepository {
    pool: DbPool,
}

impl SqlSaleRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn sale_from_row(row: &SqliteRow) -> Result<Sale, RepositoryError> {
    let opened_at: String = row.get("opened_at");
    let total_price: String = row.get("total_price");
    let total_discount_amount: String = row.get("total_discount_amount");
    let total_discounted_price: String = row.get("total_discounted_price");

    Ok(Sale::from_storage(
        SaleId(row.get("id")),
        decode_timestamp(&opened_at, "opened_at")?,
        SaleTotals {
            total_price: decode_decimal(&total_price, "total_price")?,
            total_discount_amount: decode_decimal(&total_discount_amount, "total_discount_amount")?,
            total_discounted_price: decode_decimal(
                &total_discounted_price,
                "total_discounted_price",
            )?,
        },
    ))
}

#[async_trait::async_trait]
impl SaleRepository for SqlSaleRepository {
    async fn find_by_id(&self, id: &SaleId) -> Result<Option<Sale>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, opened_at, total_price, total_discount_amount, total_discounted_price
             FROM sale
             WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(sale_from_row).transpose()
    }

    async fn save(&self, sale: Sale) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO sale
                 (id, opened_at, total_price, total_discount_amount, total_discounted_price)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 total_price = excluded.total_price,
                 total_discount_amount = excluded.total_discount_amount,
                 total_discounted_price = excluded.total_discounted_price",
        )
        .bind(&sale.id.0)
        .bind(sale.opened_at.to_rfc3339())
        .bind(sale.total_price().to_string())
        .bind(sale.total_discount_amount().to_string())
        .bind(sale.total_discounted_price().to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

pub struct SqlSoldLineRepository {
    pool: DbPool,
}

impl SqlSoldLineRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const SOLD_LINE_COLUMNS: &str = "id, sale_id, product_id, product_name, unit_price, quantity,
     discount_percent, discount_amount, final_price, deleted";

fn sold_line_from_row(row: &SqliteRow) -> Result<SoldLine, RepositoryError> {
    let id: String = row.get("id");
    let unit_price: String = row.get("unit_price");
    let discount_amount: String = row.get("discount_amount");
    let final_price: String = row.get("final_price");
    let quantity: i64 = row.get("quantity");
    let discount_percent: i64 = row.get("discount_percent");

    Ok(SoldLine {
        id: SoldLineId(id.clone()),
        sale_id: SaleId(row.get("sale_id")),
        product_id: ProductId(row.get("product_id")),
        product_name: row.get("product_name"),
        unit_price: decode_decimal(&unit_price, "unit_price")?,
        quantity: u32::try_from(quantity).map_err(|_| {
            RepositoryError::Decode(format!("invalid quantity for sold line `{id}`"))
        })?,
        discount_percent: u32::try_from(discount_percent).map_err(|_| {
            RepositoryError::Decode(format!("invalid discount_percent for sold line `{id}`"))
        })?,
        discount_amount: decode_decimal(&discount_amount, "discount_amount")?,
        final_price: decode_decimal(&final_price, "final_price")?,
        deleted: row.get::<i64, _>("deleted") != 0,
    })
}

#[async_trait::async_trait]
impl SoldLineRepository for SqlSoldLineRepository {
    async fn find_active_by_id(
        &self,
        id: &SoldLineId,
    ) -> Result<Option<SoldLine>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {SOLD_LINE_COLUMNS} FROM sold_line WHERE id = ? AND deleted = 0"
        ))
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(sold_line_from_row).transpose()
    }

    async fn find_active(
        &self,
        sale_id: &SaleId,
        product_id: &ProductId,
    ) -> Result<Option<SoldLine>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {SOLD_LINE_COLUMNS} FROM sold_line
             WHERE sale_id = ? AND product_id = ? AND deleted = 0"
        ))
        .bind(&sale_id.0)
        .bind(&product_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(sold_line_from_row).transpose()
    }

    async fn find_active_by_sale(
        &self,
        sale_id: &SaleId,
    ) -> Result<Vec<SoldLine>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {SOLD_LINE_COLUMNS} FROM sold_line WHERE sale_id = ? AND deleted = 0"
        ))
        .bind(&sale_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(sold_line_from_row).collect()
    }

    async fn save(&self, line: SoldLine) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO sold_line
                 (id, sale_id, product_id, product_name, unit_price, quantity,
                  discount_percent, discount_amount, final_price, deleted)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 quantity = excluded.quantity,
                 discount_percent = excluded.discount_percent,
                 discount_amount = excluded.discount_amount,
                 final_price = excluded.final_price,
                 deleted = excluded.deleted",
        )
        .bind(&line.id.0)
        .bind(&line.sale_id.0)
        .bind(&line.product_id.0)
        .bind(&line.product_name)
        .bind(line.unit_price.to_string())
        .bind(i64::from(line.quantity))
        .bind(i64::from(line.discount_percent))
        .bind(line.discount_amount.to_string())
        .bind(line.final_price.to_string())
        .bind(i64::from(line.deleted))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use salespoint_core::domain::product::ProductId;
    use salespoint_core::domain::sale::{Sale, SoldLine};
    use salespoint_core::pricing::SaleTotals;

    use super::{SqlSaleRepository, SqlSoldLineRepository};
    use crate::repositories::{SaleRepository, SoldLineRepository};
    use crate::{connect, migrations, DbPool};

    async fn pool() -> DbPool {
        let pool = connect("sqlite::memory:").await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        pool
    }

    #[tokio::test]
    async fn sale_totals_round_trip() {
        let repo = SqlSaleRepository::new(pool().await);
        let mut sale = Sale::open();
        sale.apply_totals(SaleTotals {
            total_price: Decimal::new(200, 0),
            total_discount_amount: Decimal::new(20, 0),
            total_discounted_price: Decimal::new(180, 0),
        });

        repo.save(sale.clone()).await.expect("save");
        let found = repo.find_by_id(&sale.id).await.expect("find").expect("present");

        assert_eq!(found.total_price(), Decimal::new(200, 0));
        assert_eq!(found.total_discounted_price(), Decimal::new(180, 0));
    }

    #[tokio::test]
    async fn deleted_lines_are_invisible_but_kept() {
        let pool = pool().await;
        let sales = SqlSaleRepository::new(pool.clone());
        let lines = SqlSoldLineRepository::new(pool);

        let sale = Sale::open();
        sales.save(sale.clone()).await.expect("save sale");

        let mut line = SoldLine::new(
            sale.id.clone(),
            ProductId("p1".to_string()),
            "Widget",
            Decimal::new(100, 0),
            2,
            Some(10),
        );
        lines.save(line.clone()).await.expect("save line");
        assert!(lines.find_active_by_id(&line.id).await.expect("find").is_some());

        line.deleted = true;
        lines.save(line.clone()).await.expect("save deleted");

        assert!(lines.find_active_by_id(&line.id).await.expect("find").is_none());
        assert!(lines
            .find_active(&sale.id, &ProductId("p1".to_string()))
            .await
            .expect("find pair")
            .is_none());
        assert!(lines.find_active_by_sale(&sale.id).await.expect("by sale").is_empty());
    }

    #[tokio::test]
    async fn active_line_lookup_by_sale_and_product() {
        let pool = pool().await;
        let sales = SqlSaleRepository::new(pool.clone());
        let lines = SqlSoldLineRepository::new(pool);

        let sale = Sale::open();
        sales.save(sale.clone()).await.expect("save sale");
        let line = SoldLine::new(
            sale.id.clone(),
            ProductId("p1".to_string()),
            "Widget",
            Decimal::new(100, 0),
            2,
            None,
        );
        lines.save(line.clone()).await.expect("save line");

        let found = lines
            .find_active(&sale.id, &ProductId("p1".to_string()))
            .await
            .expect("find")
            .expect("present");

        assert_eq!(found, line);
    }
}
