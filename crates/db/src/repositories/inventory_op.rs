use sqlx::Row;

use salespoint_core::domain::inventory::{InventoryOp, OperationKey};
use salespoint_core::domain::product::ProductId;

use super::{decode_timestamp, InventoryOpRepository, RepositoryError};
use crate::DbPool;

pub struct SqlInventoryOpRepository {
    pool: DbPool,
}

impl SqlInventoryOpRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl InventoryOpRepository for SqlInventoryOpRepository {
    async fn find(&self, key: &OperationKey) -> Result<Option<InventoryOp>, RepositoryError> {
        let row = sqlx::query(
            "SELECT op_key, product_id, delta, applied_at FROM inventory_op WHERE op_key = ?",
        )
        .bind(&key.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            let applied_at: String = row.get("applied_at");
            Ok(InventoryOp {
                key: OperationKey(row.get("op_key")),
                product_id: ProductId(row.get("product_id")),
                delta: row.get("delta"),
                applied_at: decode_timestamp(&applied_at, "applied_at")?,
            })
        })
        .transpose()
    }

    async fn record(&self, op: InventoryOp) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO inventory_op (op_key, product_id, delta, applied_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&op.key.0)
        .bind(&op.product_id.0)
        .bind(op.delta)
        .bind(op.applied_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|error| match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => RepositoryError::Conflict(
                format!("inventory op `{}` already recorded", op.key),
            ),
            _ => RepositoryError::Database(error),
        })?;

        Ok(())
    }
}
