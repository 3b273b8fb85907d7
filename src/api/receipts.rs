//! Receipt projection for the admin revenue view.
//!
//! Receipts have no storage of their own: each response is computed from
//! orders at read time, joined with the owning user for the display name.
//! A deleted user degrades to a placeholder instead of failing the view.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::db::{Order, ReceiptDetail, ReceiptSummary, User};
use crate::AppState;

use super::auth::AdminUser;
use super::error::{ok, ApiError, ApiResponse};

/// GET /receipts (admin)
pub async fn list_receipts(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<Vec<ReceiptSummary>>>, ApiError> {
    let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;

    let mut receipts = Vec::with_capacity(orders.len());
    for order in &orders {
        let name: Option<(String,)> = sqlx::query_as("SELECT name FROM users WHERE id = ?")
            .bind(&order.user_id)
            .fetch_optional(&state.db)
            .await?;

        receipts.push(ReceiptSummary::project(order, name.map(|(n,)| n)));
    }

    Ok(ok(receipts))
}

/// GET /receipts/:id (admin)
pub async fn get_receipt(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ReceiptDetail>>, ApiError> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Receipt not found"))?;

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
        .bind(&order.user_id)
        .fetch_optional(&state.db)
        .await?;

    let summary = ReceiptSummary::project(&order, user.as_ref().map(|u| u.name.clone()));
    let detail = ReceiptDetail {
        summary,
        customer_email: user.as_ref().map(|u| u.email.clone()),
        customer_phone: user.as_ref().map(|u| u.phone.clone()),
        customer_address: user.and_then(|u| u.address),
    };

    Ok(ok(detail))
}
