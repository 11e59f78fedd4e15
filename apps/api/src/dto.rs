//! # Wire Types
//!
//! JSON shapes of the HTTP API. Money goes out twice: as a decimal string
//! for display and as integer cents for arithmetic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tienda_core::{Cart, CartLine, Order, OrderItem, OrderStatus};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    /// `None` until the user adds a first item.
    pub cart_id: Option<String>,
    pub items: Vec<CartItemView>,
    pub total: String,
    pub total_cents: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub price: String,
    pub price_cents: i64,
    pub subtotal: String,
}

impl CartView {
    pub fn empty() -> Self {
        CartView {
            cart_id: None,
            items: Vec::new(),
            total: "0.00".to_string(),
            total_cents: 0,
        }
    }
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        let total = cart.subtotal();
        CartView {
            cart_id: Some(cart.id),
            items: cart.lines.iter().map(CartItemView::from).collect(),
            total: total.to_decimal_string(),
            total_cents: total.cents(),
        }
    }
}

impl From<&CartLine> for CartItemView {
    fn from(line: &CartLine) -> Self {
        CartItemView {
            product_id: line.product_id.clone(),
            product_name: line.product_name.clone(),
            quantity: line.quantity,
            price: tienda_core::Money::from_cents(line.unit_price_cents).to_decimal_string(),
            price_cents: line.unit_price_cents,
            subtotal: line.line_total().to_decimal_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
    pub total_amount: String,
    pub total_amount_cents: i64,
    pub items: Vec<OrderItemView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i64,
    pub price: String,
    pub price_cents: i64,
    pub line_total: String,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        OrderView {
            total_amount: order.total().to_decimal_string(),
            total_amount_cents: order.total_cents,
            items: order.items.iter().map(OrderItemView::from).collect(),
            id: order.id,
            user_id: order.user_id,
            created_at: order.created_at,
            status: order.status,
        }
    }
}

impl From<&OrderItem> for OrderItemView {
    fn from(item: &OrderItem) -> Self {
        OrderItemView {
            product_id: item.product_id.clone(),
            product_name: item.name_snapshot.clone(),
            quantity: item.quantity,
            price: item.unit_price().to_decimal_string(),
            price_cents: item.unit_price_cents,
            line_total: item.line_total().to_decimal_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthView {
    pub status: String,
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tienda_core::{Money, Reservation};

    #[test]
    fn test_order_view_shape() {
        let order = Order::from_reservations(
            "u-1",
            vec![Reservation {
                product_id: "A".to_string(),
                product_name: "Mug".to_string(),
                quantity: 2,
                unit_price: Money::from_cents(1000),
            }],
        );

        let json = serde_json::to_value(OrderView::from(order)).unwrap();
        assert_eq!(json["userId"], "u-1");
        assert_eq!(json["status"], "Pending");
        assert_eq!(json["totalAmount"], "20.00");
        assert_eq!(json["totalAmountCents"], 2000);
        assert_eq!(json["items"][0]["productName"], "Mug");
        assert_eq!(json["items"][0]["price"], "10.00");
        assert_eq!(json["items"][0]["lineTotal"], "20.00");
        assert!(json["createdAt"].is_string());
    }
}
