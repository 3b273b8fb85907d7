//! Client-held shopping cart.
//!
//! The cart is session state owned by one browsing client: an in-memory set
//! of lines keyed by (product id, size). Nothing here touches the database;
//! the cart only becomes durable when checkout turns it into an order
//! submission. Dropping the cart (page reload, tab close) silently discards
//! it, which is accepted behavior.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::{CreateOrderRequest, OrderItem, Product};

/// One cart line: a product snapshot plus chosen size and quantity.
/// Quantity is never below 1; reducing it past that removes the line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub price: i64,
    pub size: String,
    pub quantity: u32,
}

impl CartLine {
    pub fn subtotal(&self) -> i64 {
        self.price * self.quantity as i64
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge-or-append a line. Adding an already-present (product, size)
    /// pair increments its quantity; a new size gets its own line.
    pub fn add_line(&mut self, product: &Product, size: &str) {
        if let Some(line) = self.find_mut(&product.id, size) {
            line.quantity += 1;
            return;
        }
        self.lines.push(CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            price: product.price,
            size: size.to_string(),
            quantity: 1,
        });
    }

    /// Overwrite a line's quantity. Anything below 1 removes the line.
    pub fn set_quantity(&mut self, product_id: &str, size: &str, quantity: u32) {
        if quantity < 1 {
            self.remove_line(product_id, size);
            return;
        }
        if let Some(line) = self.find_mut(product_id, size) {
            line.quantity = quantity;
        }
    }

    /// Remove a line unconditionally. No-op when absent.
    pub fn remove_line(&mut self, product_id: &str, size: &str) {
        self.lines
            .retain(|l| !(l.product_id == product_id && l.size == size));
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of all line quantities (the badge number).
    pub fn count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Sum of price x quantity across lines. Shipping is always 0.
    pub fn total(&self) -> i64 {
        self.lines.iter().map(|l| l.subtotal()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    fn find_mut(&mut self, product_id: &str, size: &str) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|l| l.product_id == product_id && l.size == size)
    }

    /// Build the order submission from this cart. Fails locally, before any
    /// request exists, on an empty cart or a blank shipping field; the cart
    /// itself is left untouched either way.
    pub fn checkout(
        &self,
        user_id: &str,
        shipping: &ShippingDetails,
    ) -> Result<CreateOrderRequest, CheckoutError> {
        if self.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        shipping.validate()?;

        let items = self
            .lines
            .iter()
            .map(|l| OrderItem {
                product_id: l.product_id.clone(),
                name: l.name.clone(),
                price: l.price,
                quantity: l.quantity,
                size: l.size.clone(),
            })
            .collect();

        Ok(CreateOrderRequest {
            user_id: user_id.to_string(),
            items,
            total: self.total(),
            shipping_name: shipping.name.clone(),
            shipping_email: shipping.email.clone(),
            shipping_phone: shipping.phone.clone(),
            shipping_address: shipping.address.clone(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingDetails {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
}

impl ShippingDetails {
    fn validate(&self) -> Result<(), CheckoutError> {
        for (value, field) in [
            (&self.name, "name"),
            (&self.email, "email"),
            (&self.phone, "phone"),
            (&self.address, "address"),
        ] {
            if value.trim().is_empty() {
                return Err(CheckoutError::MissingShippingField(field));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("shipping {0} is required")]
    MissingShippingField(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, name: &str, price: i64) -> Product {
        Product {
            id: id.to_string(),
            name: name.to_string(),
            brand: "Acme".to_string(),
            category: "shoes".to_string(),
            description: String::new(),
            price,
            discount_percent: None,
            images: "[]".to_string(),
            sizes: r#"["41","42"]"#.to_string(),
            stock: 10,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn shipping() -> ShippingDetails {
        ShippingDetails {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            phone: "0700000000".to_string(),
            address: "Street 1".to_string(),
        }
    }

    #[test]
    fn same_product_and_size_merges_into_one_line() {
        let mut cart = Cart::new();
        let p = product("p1", "Runner", 1000);
        cart.add_line(&p, "42");
        cart.add_line(&p, "42");

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 2);
        assert_eq!(cart.lines()[0].subtotal(), 2000);
    }

    #[test]
    fn different_size_gets_its_own_line() {
        let mut cart = Cart::new();
        let p = product("p1", "Runner", 1000);
        cart.add_line(&p, "41");
        cart.add_line(&p, "42");

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.count(), 2);
    }

    #[test]
    fn quantity_zero_removes_the_line() {
        let mut cart = Cart::new();
        let p = product("p1", "Runner", 1000);
        cart.add_line(&p, "42");
        cart.add_line(&p, "41");
        cart.set_quantity("p1", "42", 0);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].size, "41");
        assert_eq!(cart.count(), 1);
    }

    #[test]
    fn set_quantity_overwrites() {
        let mut cart = Cart::new();
        let p = product("p1", "Runner", 1000);
        cart.add_line(&p, "42");
        cart.set_quantity("p1", "42", 5);

        assert_eq!(cart.count(), 5);
        assert_eq!(cart.total(), 5000);
    }

    #[test]
    fn remove_absent_line_is_a_no_op() {
        let mut cart = Cart::new();
        cart.remove_line("nope", "42");
        assert!(cart.is_empty());
    }

    #[test]
    fn clear_empties_everything() {
        let mut cart = Cart::new();
        cart.add_line(&product("p1", "Runner", 1000), "42");
        cart.add_line(&product("p2", "Cap", 300), "M");
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.count(), 0);
        assert_eq!(cart.total(), 0);
    }

    #[test]
    fn empty_cart_checkout_is_rejected_locally() {
        let cart = Cart::new();
        let err = cart.checkout("u1", &shipping()).unwrap_err();
        assert_eq!(err, CheckoutError::EmptyCart);
    }

    #[test]
    fn blank_shipping_field_is_rejected() {
        let mut cart = Cart::new();
        cart.add_line(&product("p1", "Runner", 1000), "42");

        let mut s = shipping();
        s.address = "  ".to_string();
        let err = cart.checkout("u1", &s).unwrap_err();
        assert_eq!(err, CheckoutError::MissingShippingField("address"));
        // Failure leaves the cart intact
        assert_eq!(cart.count(), 1);
    }

    #[test]
    fn checkout_snapshots_lines_and_total() {
        let mut cart = Cart::new();
        let p = product("p1", "Runner", 1000);
        cart.add_line(&p, "42");
        cart.add_line(&p, "42");

        let req = cart.checkout("u1", &shipping()).unwrap();
        assert_eq!(req.user_id, "u1");
        assert_eq!(req.total, 2000);
        assert_eq!(req.items.len(), 1);
        assert_eq!(req.items[0].name, "Runner");
        assert_eq!(req.items[0].quantity, 2);
        assert_eq!(req.items[0].size, "42");
        // Building the request does not consume the cart; the caller clears
        // it only after the submission succeeds
        assert_eq!(cart.count(), 2);
    }
}
