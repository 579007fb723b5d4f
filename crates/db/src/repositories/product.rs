use sqlx::{sqlite::SqliteRow, Row};

use salespoint_core::domain::product::{Product, ProductId};

use super::{decode_decimal, ProductRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProductRepository {
    pool: DbPool,
}

impl SqlProductRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn product_from_row(row: &SqliteRow) -> Result<Product, RepositoryError> {
    let unit_price: String = row.get("unit_price");

    Ok(Product {
        id: ProductId(row.get("id")),
        name: row.get("name"),
        unit_price: decode_decimal(&unit_price, "unit_price")?,
        inventory: row.get("inventory"),
        active: row.get::<i64, _>("active") != 0,
    })
}

#[async_trait::async_trait]
impl ProductRepository for SqlProductRepository {
    async fn find_active_by_id(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, unit_price, inventory, active
             FROM product
             WHERE id = ? AND active = 1",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn find_by_id_include_inactive(
        &self,
        id: &ProductId,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, unit_price, inventory, active FROM product WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(product_from_row).transpose()
    }

    async fn find_by_ids(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let mut products = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(product) = self.find_active_by_id(id).await? {
                products.push(product);
            }
        }
        Ok(products)
    }

    async fn save(&self, product: Product) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO product (id, name, unit_price, inventory, active)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 unit_price = excluded.unit_price,
                 inventory = excluded.inventory,
                 active = excluded.active",
        )
        .bind(&product.id.0)
        .bind(&product.name)
        .bind(product.unit_price.to_string())
        .bind(product.inventory)
        .bind(i64::from(product.active))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use salespoint_core::domain::product::{Product, ProductId};

    use super::SqlProductRepository;
    use crate::repositories::ProductRepository;
    use crate::{connect, migrations};

    async fn repo() -> SqlProductRepository {
        let pool = connect("sqlite::memory:").await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrate");
        SqlProductRepository::new(pool)
    }

    fn widget(id: &str, active: bool) -> Product {
        Product {
            id: ProductId(id.to_string()),
            name: "Widget".to_string(),
            unit_price: Decimal::new(9999, 2),
            inventory: 10,
            active,
        }
    }

    #[tokio::test]
    async fn active_lookup_hides_inactive_products() {
        let repo = repo().await;
        repo.save(widget("p1", false)).await.expect("save");

        assert!(repo.find_active_by_id(&ProductId("p1".to_string())).await.expect("find").is_none());
        assert!(repo
            .find_by_id_include_inactive(&ProductId("p1".to_string()))
            .await
            .expect("find inactive")
            .is_some());
    }

    #[tokio::test]
    async fn save_updates_inventory_in_place() {
        let repo = repo().await;
        let mut product = widget("p1", true);
        repo.save(product.clone()).await.expect("save");

        product.inventory = 3;
        repo.save(product).await.expect("save updated");

        let found = repo
            .find_active_by_id(&ProductId("p1".to_string()))
            .await
            .expect("find")
            .expect("present");
        assert_eq!(found.inventory, 3);
    }

    #[tokio::test]
    async fn find_by_ids_skips_missing_and_inactive() {
        let repo = repo().await;
        repo.save(widget("p1", true)).await.expect("save p1");
        repo.save(widget("p2", false)).await.expect("save p2");

        let found = repo
            .find_by_ids(&[
                ProductId("p1".to_string()),
                ProductId("p2".to_string()),
                ProductId("p3".to_string()),
            ])
            .await
            .expect("find");

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, ProductId("p1".to_string()));
    }
}
