//! Product catalog models and DTOs.
//!
//! List-valued fields (image URLs, size labels) are stored as JSON text
//! columns and parsed on the way out.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    pub price: i64,
    pub discount_percent: Option<i64>,
    /// JSON array of image URLs
    pub images: String,
    /// JSON array of size labels
    pub sizes: String,
    pub stock: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Product {
    pub fn get_images(&self) -> Vec<String> {
        serde_json::from_str(&self.images).unwrap_or_default()
    }

    pub fn get_sizes(&self) -> Vec<String> {
        serde_json::from_str(&self.sizes).unwrap_or_default()
    }

    pub fn to_response(&self) -> ProductResponse {
        ProductResponse {
            id: self.id.clone(),
            name: self.name.clone(),
            brand: self.brand.clone(),
            category: self.category.clone(),
            description: self.description.clone(),
            price: self.price,
            discount_percent: self.discount_percent,
            images: self.get_images(),
            sizes: self.get_sizes(),
            stock: self.stock,
            created_at: self.created_at.clone(),
            updated_at: self.updated_at.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub category: String,
    pub description: String,
    pub price: i64,
    pub discount_percent: Option<i64>,
    pub images: Vec<String>,
    pub sizes: Vec<String>,
    pub stock: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub discount_percent: Option<i64>,
    pub images: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
    pub stock: Option<i64>,
}
