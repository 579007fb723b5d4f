pub mod config;
pub mod domain;
pub mod pricing;

pub use domain::campaign::{Campaign, CampaignId};
pub use domain::inventory::{InventoryOp, OperationKey};
pub use domain::product::{Product, ProductDraft, ProductId};
pub use domain::sale::{Sale, SaleId, SoldLine, SoldLineId};
pub use pricing::{price_line, totals_over, LinePricing, SaleTotals};

// Re-exported so downstream crates share one version for timestamps.
pub use chrono;
pub use rust_decimal;
