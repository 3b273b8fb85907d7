//! Receipt projections for the admin revenue view.
//!
//! Receipts are never written: both shapes are computed from orders
//! (joined with the owning user) at read time.

use serde::{Deserialize, Serialize};

use super::order::Order;

/// Substituted when the owning user has been deleted.
pub const UNKNOWN_CUSTOMER: &str = "Unknown customer";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptSummary {
    pub id: String,
    pub customer_name: String,
    pub created_at: String,
    pub amount: i64,
    pub item_count: usize,
    pub payment_method: String,
    pub status: String,
}

/// Detail view: the summary plus the customer's contact fields,
/// when the user record still exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptDetail {
    #[serde(flatten)]
    pub summary: ReceiptSummary,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_address: Option<String>,
}

impl ReceiptSummary {
    /// Project one order into its receipt summary. `customer_name` is the
    /// owning user's display name, or `None` when that user is gone.
    pub fn project(order: &Order, customer_name: Option<String>) -> Self {
        Self {
            id: order.id.clone(),
            customer_name: customer_name.unwrap_or_else(|| UNKNOWN_CUSTOMER.to_string()),
            created_at: order.created_at.clone(),
            amount: order.total,
            item_count: order.get_items().len(),
            // No payment integration exists, so every receipt reports success
            payment_method: "none".to_string(),
            status: "success".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order() -> Order {
        Order {
            id: "o1".to_string(),
            user_id: "u1".to_string(),
            items: r#"[{"product_id":"p1","name":"Runner","price":1000,"quantity":2,"size":"42"},
                       {"product_id":"p2","name":"Cap","price":300,"quantity":1,"size":"M"}]"#
                .to_string(),
            total: 2300,
            status: "pending".to_string(),
            shipping_name: "A".to_string(),
            shipping_email: "a@x.com".to_string(),
            shipping_phone: "0700000000".to_string(),
            shipping_address: "Street 1".to_string(),
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn projection_copies_amount_and_counts_lines() {
        let receipt = ReceiptSummary::project(&order(), Some("Ann".to_string()));
        assert_eq!(receipt.amount, 2300);
        assert_eq!(receipt.item_count, 2);
        assert_eq!(receipt.customer_name, "Ann");
        assert_eq!(receipt.status, "success");
    }

    #[test]
    fn missing_user_gets_placeholder_name() {
        let receipt = ReceiptSummary::project(&order(), None);
        assert_eq!(receipt.customer_name, UNKNOWN_CUSTOMER);
    }
}
