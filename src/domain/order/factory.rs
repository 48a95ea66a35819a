//! OrderFactory - the single birthplace of orders.
//!
//! An order is a frozen snapshot of a cart at the moment its payment
//! succeeded. The factory is pure: it reads the cart, the catalog
//! snapshots, and the confirmed attempt, and produces the order the
//! settlement transaction will persist. It never touches storage itself.

use std::collections::HashMap;

use crate::domain::cart::Cart;
use crate::domain::catalog::ProductSnapshot;
use crate::domain::checkout::CheckoutAttempt;
use crate::domain::foundation::{OrderId, OrderItemId, ProductId, Timestamp};
use crate::domain::order::{ItemStatus, Order, OrderItem, OrderStatus};

use super::OrderError;

/// Builds immutable orders from successfully paid carts.
pub struct OrderFactory;

impl OrderFactory {
    /// Snapshots `cart` into a Paid order.
    ///
    /// `snapshots` must cover every product in the cart; the total charged
    /// is the amount captured on the attempt at initiation, which is the
    /// authoritative figure for the transaction.
    ///
    /// # Errors
    ///
    /// - `InvariantViolation` if the cart has no items. An empty cart must
    ///   have been rejected at initiation; reaching this point means a
    ///   caller contract was broken, and silently creating an empty order
    ///   would hide it.
    /// - `InvariantViolation` if a cart item's product has no snapshot.
    pub fn create(
        cart: &Cart,
        attempt: &CheckoutAttempt,
        snapshots: &HashMap<ProductId, ProductSnapshot>,
    ) -> Result<Order, OrderError> {
        if cart.is_empty() {
            return Err(OrderError::InvariantViolation(format!(
                "cannot create an order from empty cart {}",
                cart.id
            )));
        }

        let mut items = Vec::with_capacity(cart.items.len());
        for line in &cart.items {
            let snapshot = snapshots.get(&line.product_id).ok_or_else(|| {
                OrderError::InvariantViolation(format!(
                    "no product snapshot for {} while settling cart {}",
                    line.product_id, cart.id
                ))
            })?;

            items.push(OrderItem {
                id: OrderItemId::new(),
                product_id: Some(line.product_id),
                product_name: snapshot.title.clone(),
                product_image: snapshot.image_url.clone(),
                quantity: line.quantity,
                unit_price: snapshot.unit_price,
                subtotal: snapshot.unit_price.times(line.quantity),
                vendor: snapshot.vendor.clone(),
                status: ItemStatus::Paid,
            });
        }

        let now = Timestamp::now();
        Ok(Order {
            id: OrderId::new(),
            customer: cart.owner.clone(),
            total_price: attempt.amount,
            status: OrderStatus::Paid,
            checkout_request_id: attempt.checkout_request_id.clone(),
            phone_number: Some(attempt.phone.clone()),
            delivery_address: None,
            notes: None,
            items,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{CartId, Money, PhoneNumber, UserId};
    use rust_decimal_macros::dec;

    fn snapshot(id: ProductId, price: Money, vendor: Option<&str>) -> ProductSnapshot {
        ProductSnapshot {
            id,
            title: format!("Product {}", id),
            unit_price: price,
            stock: 100,
            image_url: Some("https://img.example/p.jpg".to_string()),
            vendor: vendor.map(|v| UserId::new(v).unwrap()),
        }
    }

    fn paid_attempt(cart_id: CartId, amount: Money) -> CheckoutAttempt {
        let mut attempt = CheckoutAttempt::new(
            cart_id,
            PhoneNumber::new("254700000000").unwrap(),
            amount,
        );
        attempt.assign_correlation_id("ws_CO_test_1").unwrap();
        attempt
    }

    #[test]
    fn snapshots_cart_into_paid_order() {
        let mut cart = Cart::new(UserId::new("customer-1").unwrap());
        let flour = ProductId::new();
        let salt = ProductId::new();
        cart.add_item(flour, 2).unwrap();
        cart.add_item(salt, 1).unwrap();

        let mut snapshots = HashMap::new();
        snapshots.insert(flour, snapshot(flour, Money::new(dec!(10.00)), Some("vendor-1")));
        snapshots.insert(salt, snapshot(salt, Money::new(dec!(5.00)), None));

        let attempt = paid_attempt(cart.id, Money::new(dec!(25.00)));
        let order = OrderFactory::create(&cart, &attempt, &snapshots).unwrap();

        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.total_price, Money::new(dec!(25.00)));
        assert_eq!(order.checkout_request_id.as_deref(), Some("ws_CO_test_1"));
        assert_eq!(order.items.len(), 2);

        let flour_line = order
            .items
            .iter()
            .find(|i| i.product_id == Some(flour))
            .unwrap();
        assert_eq!(flour_line.subtotal, Money::new(dec!(20.00)));
        assert_eq!(flour_line.status, ItemStatus::Paid);
        assert!(flour_line.vendor.is_some());

        let salt_line = order
            .items
            .iter()
            .find(|i| i.product_id == Some(salt))
            .unwrap();
        assert_eq!(salt_line.subtotal, Money::new(dec!(5.00)));
        assert!(salt_line.vendor.is_none());
    }

    #[test]
    fn empty_cart_is_an_invariant_violation() {
        let cart = Cart::new(UserId::new("customer-1").unwrap());
        let attempt = paid_attempt(cart.id, Money::ZERO);

        let result = OrderFactory::create(&cart, &attempt, &HashMap::new());
        assert!(matches!(result, Err(OrderError::InvariantViolation(_))));
    }

    #[test]
    fn missing_snapshot_is_an_invariant_violation() {
        let mut cart = Cart::new(UserId::new("customer-1").unwrap());
        cart.add_item(ProductId::new(), 1).unwrap();
        let attempt = paid_attempt(cart.id, Money::new(dec!(10.00)));

        let result = OrderFactory::create(&cart, &attempt, &HashMap::new());
        assert!(matches!(result, Err(OrderError::InvariantViolation(_))));
    }
}
