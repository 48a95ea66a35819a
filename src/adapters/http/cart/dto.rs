//! HTTP DTOs for cart endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::cart::{PricedCart, PricedLine};
use crate::domain::foundation::{CartItemId, Money, ProductId};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to add a product to the active cart.
#[derive(Debug, Clone, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: ProductId,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

/// Request to change a line's quantity.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateCartItemRequest {
    pub quantity: u32,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// One cart line as served to clients.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemResponse {
    pub id: CartItemId,
    pub product_id: ProductId,
    pub title: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
    pub image_url: Option<String>,
    pub available: bool,
}

/// The active cart as served to clients.
///
/// `is_ordered` and `is_paid` are both derived from the cart's settlement
/// state; they are kept on the wire for client compatibility.
#[derive(Debug, Clone, Serialize)]
pub struct CartResponse {
    pub id: String,
    pub is_ordered: bool,
    pub is_paid: bool,
    pub items: Vec<CartItemResponse>,
    pub total_price: Money,
    pub created_at: String,
}

impl From<PricedCart> for CartResponse {
    fn from(view: PricedCart) -> Self {
        let settled = view.cart.is_settled();
        Self {
            id: view.cart.id.to_string(),
            is_ordered: settled,
            is_paid: settled,
            items: view.lines.into_iter().map(Into::into).collect(),
            total_price: view.total,
            created_at: view.cart.created_at.to_rfc3339(),
        }
    }
}

impl From<PricedLine> for CartItemResponse {
    fn from(line: PricedLine) -> Self {
        Self {
            id: line.item.id,
            product_id: line.item.product_id,
            title: line.title,
            quantity: line.item.quantity,
            unit_price: line.unit_price,
            subtotal: line.line_total,
            image_url: line.image_url,
            available: line.available,
        }
    }
}
