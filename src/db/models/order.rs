//! Order models and DTOs.
//!
//! An order is a snapshot taken at checkout: line items carry the product
//! name and price as they were at submission time, not live references.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Closed set of order states. Creation always starts at `Pending`;
/// the only mutation is an admin moving the status within this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Canceled,
    Delivered,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Delivered => "delivered",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "canceled" => Some(OrderStatus::Canceled),
            "delivered" => Some(OrderStatus::Delivered),
            _ => None,
        }
    }
}

/// One line of an order, copied verbatim from the cart at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub price: i64,
    pub quantity: u32,
    pub size: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    /// JSON array of `OrderItem`
    pub items: String,
    pub total: i64,
    pub status: String,
    pub shipping_name: String,
    pub shipping_email: String,
    pub shipping_phone: String,
    pub shipping_address: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Order {
    pub fn get_items(&self) -> Vec<OrderItem> {
        serde_json::from_str(&self.items).unwrap_or_default()
    }

    pub fn to_response(&self) -> OrderResponse {
        OrderResponse {
            id: self.id.clone(),
            user_id: self.user_id.clone(),
            items: self.get_items(),
            total: self.total,
            status: self.status.clone(),
            shipping_name: self.shipping_name.clone(),
            shipping_email: self.shipping_email.clone(),
            shipping_phone: self.shipping_phone.clone(),
            shipping_address: self.shipping_address.clone(),
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderResponse {
    pub id: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub total: i64,
    pub status: String,
    pub shipping_name: String,
    pub shipping_email: String,
    pub shipping_phone: String,
    pub shipping_address: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Checkout submission payload. The total is trusted as posted; no stock
/// or price re-validation happens server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub total: i64,
    pub shipping_name: String,
    pub shipping_email: String,
    pub shipping_phone: String,
    pub shipping_address: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for s in [
            OrderStatus::Pending,
            OrderStatus::Canceled,
            OrderStatus::Delivered,
        ] {
            assert_eq!(OrderStatus::parse(s.as_str()), Some(s));
        }
    }

    #[test]
    fn legacy_four_value_states_are_not_accepted() {
        assert_eq!(OrderStatus::parse("paid"), None);
        assert_eq!(OrderStatus::parse("shipped"), None);
        assert_eq!(OrderStatus::parse(""), None);
    }

    #[test]
    fn items_column_parses_into_lines() {
        let order = Order {
            id: "o1".to_string(),
            user_id: "u1".to_string(),
            items: r#"[{"product_id":"p1","name":"Runner","price":1000,"quantity":2,"size":"42"}]"#
                .to_string(),
            total: 2000,
            status: "pending".to_string(),
            shipping_name: "A".to_string(),
            shipping_email: "a@x.com".to_string(),
            shipping_phone: "0700000000".to_string(),
            shipping_address: "Street 1".to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        };

        let items = order.get_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
        assert_eq!(items[0].price, 1000);
    }
}
