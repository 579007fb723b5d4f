use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::product::ProductId;
use crate::pricing::{price_line, SaleTotals};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SaleId(pub String);

impl SaleId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for SaleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoldLineId(pub String);

impl SoldLineId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl std::fmt::Display for SoldLineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A sale transaction. Lines live in their own repository; the three
/// derived totals are private and can only be written through
/// [`Sale::apply_totals`], which keeps the totals recomputation the sole
/// writer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub opened_at: DateTime<Utc>,
    total_price: Decimal,
    total_discount_amount: Decimal,
    total_discounted_price: Decimal,
}

impl Sale {
    pub fn open() -> Self {
        Self {
            id: SaleId::generate(),
            opened_at: Utc::now(),
            total_price: Decimal::ZERO,
            total_discount_amount: Decimal::ZERO,
            total_discounted_price: Decimal::ZERO,
        }
    }

    /// Rehydrate a persisted sale. Repository use only.
    pub fn from_storage(id: SaleId, opened_at: DateTime<Utc>, totals: SaleTotals) -> Self {
        Self {
            id,
            opened_at,
            total_price: totals.total_price,
            total_discount_amount: totals.total_discount_amount,
            total_discounted_price: totals.total_discounted_price,
        }
    }

    pub fn apply_totals(&mut self, totals: SaleTotals) {
        self.total_price = totals.total_price;
        self.total_discount_amount = totals.total_discount_amount;
        self.total_discounted_price = totals.total_discounted_price;
    }

    pub fn total_price(&self) -> Decimal {
        self.total_price
    }

    pub fn total_discount_amount(&self) -> Decimal {
        self.total_discount_amount
    }

    pub fn total_discounted_price(&self) -> Decimal {
        self.total_discounted_price
    }
}

/// One product's quantity and pricing record within a sale.
///
/// `unit_price` is snapshotted from the catalog when the line is first
/// created and never refreshed afterwards: the recorded price is a
/// receipt, not a live quote.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoldLine {
    pub id: SoldLineId,
    pub sale_id: SaleId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub discount_percent: u32,
    pub discount_amount: Decimal,
    pub final_price: Decimal,
    pub deleted: bool,
}

impl SoldLine {
    pub fn new(
        sale_id: SaleId,
        product_id: ProductId,
        product_name: impl Into<String>,
        unit_price: Decimal,
        quantity: u32,
        discount_percent: Option<u32>,
    ) -> Self {
        let mut line = Self {
            id: SoldLineId::generate(),
            sale_id,
            product_id,
            product_name: product_name.into(),
            unit_price,
            quantity,
            discount_percent: 0,
            discount_amount: Decimal::ZERO,
            final_price: Decimal::ZERO,
            deleted: false,
        };
        line.reprice(discount_percent);
        line
    }

    pub fn total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Recompute discount amount and final price over the stored unit
    /// price and the current quantity.
    pub fn reprice(&mut self, discount_percent: Option<u32>) {
        let pricing = price_line(self.unit_price, self.quantity, discount_percent);
        self.discount_percent = pricing.discount_percent;
        self.discount_amount = pricing.discount_amount;
        self.final_price = pricing.final_price;
    }
}
