//! Order endpoints: checkout submission, listing, status updates, deletion.
//!
//! An order stores the client-submitted snapshot verbatim: line items and
//! total are trusted as posted, and stock is never decremented. Payment is
//! a no-op; every order starts out `pending`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    CreateOrderRequest, Order, OrderResponse, OrderStatus, UpdateOrderStatusRequest,
};
use crate::AppState;

use super::auth::{AdminUser, AuthUser};
use super::error::{ok, ApiError, ApiResponse};
use super::validation::validate_required;

fn validate_create(req: &CreateOrderRequest) -> Result<(), ApiError> {
    if req.items.is_empty() {
        return Err(ApiError::bad_request("Order must contain at least one item"));
    }
    for item in &req.items {
        if item.quantity < 1 {
            return Err(ApiError::bad_request("Item quantity must be at least 1"));
        }
    }
    validate_required(&req.shipping_name, "shipping_name").map_err(ApiError::bad_request)?;
    validate_required(&req.shipping_email, "shipping_email").map_err(ApiError::bad_request)?;
    validate_required(&req.shipping_phone, "shipping_phone").map_err(ApiError::bad_request)?;
    validate_required(&req.shipping_address, "shipping_address").map_err(ApiError::bad_request)?;
    Ok(())
}

/// POST /orders
///
/// Checkout submission. Callers submit their own cart; the order is
/// recorded under the authenticated user regardless of the posted user_id.
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<OrderResponse>>), ApiError> {
    validate_create(&req)?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let items_json = serde_json::to_string(&req.items)
        .map_err(|e| ApiError::internal(format!("Failed to encode items: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO orders (id, user_id, items, total, status, shipping_name, shipping_email, shipping_phone, shipping_address, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&user.id)
    .bind(&items_json)
    .bind(req.total)
    .bind(OrderStatus::Pending.as_str())
    .bind(&req.shipping_name)
    .bind(&req.shipping_email)
    .bind(&req.shipping_phone)
    .bind(&req.shipping_address)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(order = %order.id, total = order.total, "Order created");
    Ok((StatusCode::CREATED, ok(order.to_response())))
}

/// GET /orders (admin)
pub async fn list_orders(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<Vec<OrderResponse>>>, ApiError> {
    let orders = sqlx::query_as::<_, Order>("SELECT * FROM orders ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;

    Ok(ok(orders.iter().map(Order::to_response).collect()))
}

/// GET /orders/user/:user_id
pub async fn list_user_orders(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(user_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<OrderResponse>>>, ApiError> {
    if caller.id != user_id && !caller.is_admin() {
        return Err(ApiError::forbidden("Not allowed to view these orders"));
    }

    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(&user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(ok(orders.iter().map(Order::to_response).collect()))
}

/// PUT /orders/:id (admin)
///
/// The only mutation is the status field, constrained to the closed
/// pending/canceled/delivered set.
pub async fn update_order_status(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateOrderStatusRequest>,
) -> Result<Json<ApiResponse<OrderResponse>>, ApiError> {
    let status = OrderStatus::parse(&req.status).ok_or_else(|| {
        ApiError::bad_request("status must be one of: pending, canceled, delivered")
    })?;

    let now = chrono::Utc::now().to_rfc3339();
    let result = sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(&now)
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Order not found"));
    }

    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(order = %order.id, status = %order.status, "Order status updated");
    Ok(ok(order.to_response()))
}

/// DELETE /orders/:id (admin)
pub async fn delete_order(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<OrderResponse>>, ApiError> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Order not found"))?;

    sqlx::query("DELETE FROM orders WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    Ok(ok(order.to_response()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::OrderItem;

    fn request() -> CreateOrderRequest {
        CreateOrderRequest {
            user_id: "u1".to_string(),
            items: vec![OrderItem {
                product_id: "p1".to_string(),
                name: "Runner".to_string(),
                price: 1000,
                quantity: 2,
                size: "42".to_string(),
            }],
            total: 2000,
            shipping_name: "A".to_string(),
            shipping_email: "a@x.com".to_string(),
            shipping_phone: "0700000000".to_string(),
            shipping_address: "Street 1".to_string(),
        }
    }

    #[test]
    fn valid_submission_passes() {
        assert!(validate_create(&request()).is_ok());
    }

    #[test]
    fn empty_item_list_is_rejected() {
        let mut req = request();
        req.items.clear();
        assert!(validate_create(&req).is_err());
    }

    #[test]
    fn zero_quantity_line_is_rejected() {
        let mut req = request();
        req.items[0].quantity = 0;
        assert!(validate_create(&req).is_err());
    }

    #[test]
    fn blank_shipping_field_is_rejected() {
        let mut req = request();
        req.shipping_address = " ".to_string();
        assert!(validate_create(&req).is_err());
    }
}
