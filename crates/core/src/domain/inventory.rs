use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::product::ProductId;

/// Idempotency key for one stock-affecting mutation. Callers mint a fresh
/// key per logical request and reuse it on retry, so a redelivered request
/// cannot apply its delta twice.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationKey(pub String);

impl OperationKey {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for OperationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record of an inventory delta that was pushed to the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryOp {
    pub key: OperationKey,
    pub product_id: ProductId,
    pub delta: i64,
    pub applied_at: DateTime<Utc>,
}

impl InventoryOp {
    pub fn applied(key: OperationKey, product_id: ProductId, delta: i64) -> Self {
        Self { key, product_id, delta, applied_at: Utc::now() }
    }

    /// A replayed request must carry the same product and delta as the
    /// recorded one to be treated as the same operation.
    pub fn matches(&self, product_id: &ProductId, delta: i64) -> bool {
        &self.product_id == product_id && self.delta == delta
    }
}
