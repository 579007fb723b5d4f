//! Sale, campaign, and inventory consistency services.
//!
//! Services in this crate own all writes to their aggregates: campaigns
//! and product claims go through [`CampaignService`], stock deltas
//! through [`InventoryReconciler`], sold lines through
//! [`SoldLineService`], and sale totals through [`SaleTotalsService`].

pub mod campaigns;
pub mod errors;
pub mod inventory;
pub mod keyed_lock;
pub mod lines;
pub mod totals;

pub use campaigns::CampaignService;
pub use errors::{CampaignError, LedgerError};
pub use inventory::InventoryReconciler;
pub use keyed_lock::KeyedMutex;
pub use lines::SoldLineService;
pub use totals::SaleTotalsService;
