//! GetActiveCartHandler - query for the owner's active cart, priced live.

use std::sync::Arc;

use crate::domain::cart::{Cart, CartError, CartItem};
use crate::domain::foundation::{Money, ProductId, UserId};
use crate::ports::{CartRepository, ProductCatalog};

use super::load_or_create_active;

/// One cart line priced from the live catalog.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub item: CartItem,
    pub title: String,
    pub unit_price: Money,
    pub line_total: Money,
    pub image_url: Option<String>,
    /// False when the product has vanished from the catalog since it was
    /// added; such lines price at zero and block initiation.
    pub available: bool,
}

/// A cart together with its live pricing.
#[derive(Debug, Clone)]
pub struct PricedCart {
    pub cart: Cart,
    pub lines: Vec<PricedLine>,
    pub total: Money,
}

/// Query handler for the active cart view.
pub struct GetActiveCartHandler {
    carts: Arc<dyn CartRepository>,
    catalog: Arc<dyn ProductCatalog>,
}

impl GetActiveCartHandler {
    pub fn new(carts: Arc<dyn CartRepository>, catalog: Arc<dyn ProductCatalog>) -> Self {
        Self { carts, catalog }
    }

    /// Returns the owner's active cart, creating an empty one if none
    /// exists yet.
    pub async fn handle(&self, owner: &UserId) -> Result<PricedCart, CartError> {
        let cart = load_or_create_active(&self.carts, owner).await?;
        price_cart(&self.catalog, cart).await
    }
}

/// Prices a cart's lines against the live catalog.
pub(crate) async fn price_cart(
    catalog: &Arc<dyn ProductCatalog>,
    cart: Cart,
) -> Result<PricedCart, CartError> {
    let ids: Vec<ProductId> = cart.items.iter().map(|i| i.product_id).collect();
    let snapshots = catalog.snapshots(&ids).await?;

    let mut lines = Vec::with_capacity(cart.items.len());
    let mut total = Money::ZERO;
    for item in &cart.items {
        match snapshots.get(&item.product_id) {
            Some(snapshot) => {
                let line_total = snapshot.line_total(item.quantity);
                total = total + line_total;
                lines.push(PricedLine {
                    item: item.clone(),
                    title: snapshot.title.clone(),
                    unit_price: snapshot.unit_price,
                    line_total,
                    image_url: snapshot.image_url.clone(),
                    available: true,
                });
            }
            None => lines.push(PricedLine {
                item: item.clone(),
                title: "(no longer available)".to_string(),
                unit_price: Money::ZERO,
                line_total: Money::ZERO,
                image_url: None,
                available: false,
            }),
        }
    }

    Ok(PricedCart { cart, lines, total })
}
