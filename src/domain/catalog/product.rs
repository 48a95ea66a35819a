//! Read-only product snapshot.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Money, ProductId, UserId};

/// Point-in-time view of a product, as served by the catalog collaborator.
///
/// The optional fields are part of the contract: not every product has an
/// image, and marketplace listings without a vendor account have no vendor.
/// Consumers must handle absence explicitly instead of probing attributes
/// at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    /// Catalog identifier.
    pub id: ProductId,

    /// Display title, frozen into order items at settlement.
    pub title: String,

    /// Current unit price. Live reads use this; orders freeze their own copy.
    pub unit_price: Money,

    /// Units available for sale.
    pub stock: u64,

    /// Image URL, if the product has one.
    pub image_url: Option<String>,

    /// The vendor who fulfils this product, if one is attached.
    pub vendor: Option<UserId>,
}

impl ProductSnapshot {
    /// Price of `quantity` units at the snapshot price.
    pub fn line_total(&self, quantity: u32) -> Money {
        self.unit_price.times(quantity)
    }

    /// True if the snapshot has enough stock to cover `quantity` units.
    pub fn covers(&self, quantity: u32) -> bool {
        self.stock >= u64::from(quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot(stock: u64) -> ProductSnapshot {
        ProductSnapshot {
            id: ProductId::new(),
            title: "Grade 1 Maize Flour".to_string(),
            unit_price: Money::new(dec!(10.00)),
            stock,
            image_url: None,
            vendor: None,
        }
    }

    #[test]
    fn line_total_scales_unit_price() {
        assert_eq!(snapshot(10).line_total(2), Money::new(dec!(20.00)));
    }

    #[test]
    fn covers_compares_against_stock() {
        assert!(snapshot(3).covers(3));
        assert!(!snapshot(3).covers(4));
    }
}
