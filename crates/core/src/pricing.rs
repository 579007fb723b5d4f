//! Line and sale pricing math.
//!
//! Pure functions: no persistence, no remote calls. The discount rule is
//! shared by line creation, merge, and quantity updates so the three paths
//! cannot drift apart.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::sale::SoldLine;

/// Result of applying the discount rule to one line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePricing {
    pub total: Decimal,
    pub discount_percent: u32,
    pub discount_amount: Decimal,
    pub final_price: Decimal,
}

/// Derived totals of a sale over its active lines.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    pub total_price: Decimal,
    pub total_discount_amount: Decimal,
    pub total_discounted_price: Decimal,
}

/// `total = unit_price * quantity`. A present, positive discount takes
/// `discount_amount = total * discount / 100` off; otherwise the line is
/// sold at full price with a zeroed discount.
pub fn price_line(unit_price: Decimal, quantity: u32, discount_percent: Option<u32>) -> LinePricing {
    let total = unit_price * Decimal::from(quantity);

    match discount_percent {
        Some(discount) if discount > 0 => {
            let discount_amount = total * Decimal::from(discount) / Decimal::from(100u32);
            LinePricing {
                total,
                discount_percent: discount,
                discount_amount,
                final_price: total - discount_amount,
            }
        }
        _ => LinePricing {
            total,
            discount_percent: 0,
            discount_amount: Decimal::ZERO,
            final_price: total,
        },
    }
}

/// Sum the three derived sale fields over the ACTIVE lines only. Deleted
/// lines stay in the collection but contribute nothing.
pub fn totals_over<'a>(lines: impl IntoIterator<Item = &'a SoldLine>) -> SaleTotals {
    let mut totals = SaleTotals::default();
    for line in lines.into_iter().filter(|line| !line.deleted) {
        totals.total_price += line.total();
        totals.total_discount_amount += line.discount_amount;
        totals.total_discounted_price += line.final_price;
    }
    totals
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::{price_line, totals_over, SaleTotals};
    use crate::domain::product::ProductId;
    use crate::domain::sale::{Sale, SoldLine};

    #[test]
    fn discounted_line_splits_total_into_discount_and_final() {
        let pricing = price_line(Decimal::new(100, 0), 2, Some(10));

        assert_eq!(pricing.total, Decimal::new(200, 0));
        assert_eq!(pricing.discount_percent, 10);
        assert_eq!(pricing.discount_amount, Decimal::new(20, 0));
        assert_eq!(pricing.final_price, Decimal::new(180, 0));
    }

    #[test]
    fn absent_or_zero_discount_sells_at_full_price() {
        for discount in [None, Some(0)] {
            let pricing = price_line(Decimal::new(250, 1), 4, discount);

            assert_eq!(pricing.total, Decimal::new(1000, 1));
            assert_eq!(pricing.discount_percent, 0);
            assert_eq!(pricing.discount_amount, Decimal::ZERO);
            assert_eq!(pricing.final_price, Decimal::new(1000, 1));
        }
    }

    #[test]
    fn totals_exclude_deleted_lines() {
        let sale = Sale::open();
        let active = SoldLine::new(
            sale.id.clone(),
            ProductId("p1".to_string()),
            "Widget",
            Decimal::new(100, 0),
            2,
            Some(10),
        );
        let mut deleted = SoldLine::new(
            sale.id.clone(),
            ProductId("p2".to_string()),
            "Gadget",
            Decimal::new(50, 0),
            1,
            None,
        );
        deleted.deleted = true;

        let totals = totals_over([&active, &deleted]);

        assert_eq!(
            totals,
            SaleTotals {
                total_price: Decimal::new(200, 0),
                total_discount_amount: Decimal::new(20, 0),
                total_discounted_price: Decimal::new(180, 0),
            }
        );
    }

    #[test]
    fn totals_over_no_lines_are_zero() {
        assert_eq!(totals_over([]), SaleTotals::default());
    }
}
