//! Support inbox: public contact form, admin CRUD and email replies.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{Contact, CreateContactRequest, ReplyContactRequest, UpdateContactRequest};
use crate::AppState;

use super::auth::AdminUser;
use super::error::{ok, ApiError, ApiResponse};
use super::validation::{validate_email, validate_name, validate_required};

/// POST /contacts (public)
pub async fn create_contact(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateContactRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Contact>>), ApiError> {
    validate_name(&req.name).map_err(ApiError::bad_request)?;
    validate_email(&req.email).map_err(ApiError::bad_request)?;
    validate_required(&req.message, "message").map_err(ApiError::bad_request)?;

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO contacts (id, name, email, message, read, created_at) VALUES (?, ?, ?, ?, 0, ?)",
    )
    .bind(&id)
    .bind(&req.name)
    .bind(&req.email)
    .bind(&req.message)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let contact = sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok((StatusCode::CREATED, ok(contact)))
}

/// GET /contacts (admin)
pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<Vec<Contact>>>, ApiError> {
    let contacts =
        sqlx::query_as::<_, Contact>("SELECT * FROM contacts ORDER BY created_at DESC")
            .fetch_all(&state.db)
            .await?;

    Ok(ok(contacts))
}

/// GET /contacts/:id (admin)
pub async fn get_contact(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Contact>>, ApiError> {
    let contact = sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Contact message not found"))?;

    Ok(ok(contact))
}

/// PATCH /contacts/:id (admin) - read-flag toggle
pub async fn update_contact(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateContactRequest>,
) -> Result<Json<ApiResponse<Contact>>, ApiError> {
    let result = sqlx::query("UPDATE contacts SET read = ? WHERE id = ?")
        .bind(req.read)
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Contact message not found"));
    }

    let contact = sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(ok(contact))
}

/// POST /contacts/:id/reply (admin)
///
/// Sends the reply by email and marks the message read. The reply body
/// itself is not persisted.
pub async fn reply_contact(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(req): Json<ReplyContactRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    validate_required(&req.body, "body").map_err(ApiError::bad_request)?;

    let contact = sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Contact message not found"))?;

    let subject = req
        .subject
        .unwrap_or_else(|| "Re: your message to SwiftShop".to_string());
    state
        .mailer
        .send_contact_reply(&contact.email, &subject, &req.body)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to send reply: {}", e)))?;

    sqlx::query("UPDATE contacts SET read = 1 WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    tracing::info!(contact = %contact.id, "Reply sent");
    Ok(ok(json!({ "message": "Reply sent" })))
}

/// DELETE /contacts/:id (admin)
pub async fn delete_contact(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Contact>>, ApiError> {
    let contact = sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("Contact message not found"))?;

    sqlx::query("DELETE FROM contacts WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    Ok(ok(contact))
}
