//! Inventory reconciliation against the external catalog.
//!
//! The catalog owns the stock counter; this component is the only place
//! that pushes deltas to it. There is no distributed transaction: a
//! reservation is a compensable step, and the idempotency ledger keeps a
//! retried request from applying its delta twice.

use std::sync::Arc;

use tracing::{debug, info};

use salespoint_catalog::ProductCatalog;
use salespoint_core::domain::inventory::{InventoryOp, OperationKey};
use salespoint_core::domain::product::{Product, ProductId};
use salespoint_db::repositories::InventoryOpRepository;

use crate::errors::LedgerError;
use crate::keyed_lock::KeyedMutex;

pub struct InventoryReconciler {
    catalog: Arc<dyn ProductCatalog>,
    ops: Arc<dyn InventoryOpRepository>,
    locks: KeyedMutex,
}

impl InventoryReconciler {
    pub fn new(catalog: Arc<dyn ProductCatalog>, ops: Arc<dyn InventoryOpRepository>) -> Self {
        Self { catalog, ops, locks: KeyedMutex::default() }
    }

    /// Applies a signed stock delta for one product under that product's
    /// critical section and returns the post-write snapshot.
    ///
    /// Negative deltas are reservations: if the counter would go below
    /// zero the call fails with `InsufficientStock` and no catalog write
    /// happens. A key already recorded for the same (product, delta) is a
    /// replay and returns without a second write.
    pub async fn apply_delta(
        &self,
        product_id: &ProductId,
        delta: i64,
        key: &OperationKey,
    ) -> Result<Product, LedgerError> {
        let _guard = self.locks.lock(&product_id.0).await;

        if let Some(recorded) = self.ops.find(key).await? {
            if recorded.matches(product_id, delta) {
                debug!(%key, %product_id, delta, "stock delta already applied, skipping");
                return self.catalog.get_by_id(product_id).await.map_err(Into::into);
            }
            return Err(LedgerError::DuplicateOperation(key.clone()));
        }

        let mut product = self.catalog.get_by_id(product_id).await?;
        let new_inventory = product.inventory + delta;
        if delta < 0 && new_inventory < 0 {
            return Err(LedgerError::InsufficientStock {
                product_id: product.id.clone(),
                name: product.name.clone(),
                requested: -delta,
                available: product.inventory,
            });
        }

        product.inventory = new_inventory;
        self.catalog.set_inventory(&product).await?;

        // The catalog write is committed at this point; a failure below
        // leaves the remote counter updated with no local record of it.
        self.ops
            .record(InventoryOp::applied(key.clone(), product_id.clone(), delta))
            .await
            .map_err(|error| LedgerError::PartialReconciliation {
                product_id: product_id.clone(),
                detail: format!("delta {delta} pushed but not recorded: {error}"),
            })?;

        info!(%product_id, delta, inventory = new_inventory, "stock delta applied");
        Ok(product)
    }
}
