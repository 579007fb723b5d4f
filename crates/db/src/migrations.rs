use sqlx::migrate::{MigrateError, Migrator};

use crate::DbPool;

pub static MIGRATOR: Migrator = sqlx::migrate!("../../migrations");

pub async fn run_pending(pool: &DbPool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

#[cfg(test)]
mod tests {
    use sqlx::Row;

    use super::run_pending;
    use crate::connect;

    const MANAGED_SCHEMA_OBJECTS: &[&str] = &[
        "product",
        "campaign",
        "campaign_product",
        "sale",
        "sold_line",
        "inventory_op",
        "idx_product_active",
        "idx_campaign_deleted",
        "idx_campaign_product_product_id",
        "idx_sold_line_sale_id",
        "idx_sold_line_active_sale_product",
        "idx_inventory_op_product_id",
    ];

    #[tokio::test]
    async fn migrations_create_the_managed_schema() {
        let pool = connect("sqlite::memory:").await.expect("connect");
        run_pending(&pool).await.expect("migrate");

        let rows = sqlx::query("SELECT name FROM sqlite_master WHERE name NOT LIKE 'sqlite_%'")
            .fetch_all(&pool)
            .await
            .expect("query schema");
        let names: Vec<String> = rows.iter().map(|row| row.get("name")).collect();

        for object in MANAGED_SCHEMA_OBJECTS {
            assert!(names.iter().any(|name| name == object), "missing schema object: {object}");
        }
    }

    #[tokio::test]
    async fn migrations_are_rerunnable() {
        let pool = connect("sqlite::memory:").await.expect("connect");
        run_pending(&pool).await.expect("first run");
        run_pending(&pool).await.expect("second run");
    }
}
