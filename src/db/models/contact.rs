//! Contact message models and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: String,
    pub message: String,
    pub read: bool,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateContactRequest {
    pub read: bool,
}

/// Reply sent out-of-band by email; the reply body is not persisted.
#[derive(Debug, Deserialize)]
pub struct ReplyContactRequest {
    pub subject: Option<String>,
    pub body: String,
}
