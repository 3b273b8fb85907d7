//! User endpoints: registration, login, password reset, profile CRUD and
//! avatar upload.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::{
    ChangePasswordRequest, ForgotPasswordRequest, LoginRequest, LoginResponse, RegisterRequest,
    ResetPasswordRequest, UpdateUserRequest, User, UserResponse,
};
use crate::AppState;

use super::auth::{self, AdminUser, AuthUser};
use super::error::{ok, ApiError, ApiResponse};
use super::uploads;
use super::validation::{
    validate_email, validate_name, validate_password, validate_phone, validate_username,
};

fn validate_register(req: &RegisterRequest) -> Result<(), ApiError> {
    validate_name(&req.name).map_err(ApiError::bad_request)?;
    validate_email(&req.email).map_err(ApiError::bad_request)?;
    validate_username(&req.username).map_err(ApiError::bad_request)?;
    validate_phone(&req.phone).map_err(ApiError::bad_request)?;
    validate_password(&req.password).map_err(ApiError::bad_request)?;
    Ok(())
}

/// POST /users
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserResponse>>), ApiError> {
    validate_register(&req)?;

    let id = Uuid::new_v4().to_string();
    let password_hash = auth::hash_password(&req.password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, username, phone, password_hash, address, role, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, 'user', ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.name)
    .bind(&req.email)
    .bind(&req.username)
    .bind(&req.phone)
    .bind(&password_hash)
    .bind(&req.address)
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE constraint failed") => {
            ApiError::conflict("Email or username is already taken")
        }
        _ => e.into(),
    })?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(user = %user.username, "User registered");
    Ok((StatusCode::CREATED, ok(UserResponse::from(user))))
}

/// POST /users/login
///
/// The identifier may be an email address or a username. A missing account
/// and a wrong password produce the identical response.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    let user: Option<User> =
        sqlx::query_as("SELECT * FROM users WHERE email = ? OR username = ?")
            .bind(&req.identifier)
            .bind(&req.identifier)
            .fetch_optional(&state.db)
            .await?;

    let user = user.ok_or_else(ApiError::invalid_credentials)?;

    if !auth::verify_password(&req.password, &user.password_hash) {
        return Err(ApiError::invalid_credentials());
    }

    let token = auth::issue_session_token(&state.config.auth.jwt_secret, &user.id, &user.role)?;

    Ok(ok(LoginResponse {
        token,
        user: UserResponse::from(user),
    }))
}

/// POST /users/forgot-password
///
/// Always answers the same way, whether or not the address is known.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
        .bind(&req.email)
        .fetch_optional(&state.db)
        .await?;

    if let Some(user) = user {
        let token = auth::issue_reset_token(&state.config.auth.jwt_secret, &user.id)?;
        let reset_url = format!(
            "{}/reset-password?token={}",
            state.config.server.public_url, token
        );
        if let Err(e) = state.mailer.send_password_reset(&user.email, &reset_url).await {
            tracing::error!("Failed to send reset email: {}", e);
        }
    }

    Ok(ok(json!({
        "message": "If that email is registered, a reset link has been sent"
    })))
}

/// POST /users/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let claims = auth::verify_token(&state.config.auth.jwt_secret, &req.token, auth::PURPOSE_RESET)
        .map_err(|_| ApiError::bad_request("Invalid or expired reset token"))?;

    validate_password(&req.password).map_err(ApiError::bad_request)?;

    let password_hash = auth::hash_password(&req.password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;
    let now = chrono::Utc::now().to_rfc3339();

    let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(&password_hash)
        .bind(&now)
        .bind(&claims.sub)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::bad_request("Invalid or expired reset token"));
    }

    Ok(ok(json!({ "message": "Password has been reset" })))
}

/// POST /users/upload (multipart)
///
/// Stores the avatar image and points the caller's profile at it.
pub async fn upload_avatar(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let mut url: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        if field.file_name().is_none() {
            continue;
        }
        let original_name = field.file_name().map(|s| s.to_string());
        let content_type = field.content_type().map(|s| s.to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {}", e)))?;

        url = Some(
            uploads::store_file(
                &state.config.server.data_dir,
                original_name.as_deref(),
                content_type.as_deref(),
                &bytes,
            )
            .await?,
        );
        break;
    }

    let url = url.ok_or_else(|| ApiError::bad_request("No file in upload"))?;
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query("UPDATE users SET avatar_url = ?, updated_at = ? WHERE id = ?")
        .bind(&url)
        .bind(&now)
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    Ok(ok(json!({ "avatar_url": url })))
}

/// GET /users (admin)
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, ApiError> {
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(&state.db)
        .await?;

    Ok(ok(users.into_iter().map(UserResponse::from).collect()))
}

fn require_self_or_admin(caller: &AuthUser, target_id: &str) -> Result<(), ApiError> {
    if caller.id != target_id && !caller.is_admin() {
        return Err(ApiError::forbidden("Not allowed to access this profile"));
    }
    Ok(())
}

/// GET /users/:id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    require_self_or_admin(&caller, &id)?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(ok(UserResponse::from(user)))
}

/// PUT /users/:id
///
/// The update DTO has no password field; passwords only change through the
/// dedicated change-password operation, which always re-hashes.
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    require_self_or_admin(&caller, &id)?;

    if let Some(ref email) = req.email {
        validate_email(email).map_err(ApiError::bad_request)?;
    }
    if let Some(ref username) = req.username {
        validate_username(username).map_err(ApiError::bad_request)?;
    }
    if let Some(ref name) = req.name {
        validate_name(name).map_err(ApiError::bad_request)?;
    }
    if let Some(ref phone) = req.phone {
        validate_phone(phone).map_err(ApiError::bad_request)?;
    }

    let _existing = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE users SET
            name = COALESCE(?, name),
            email = COALESCE(?, email),
            username = COALESCE(?, username),
            phone = COALESCE(?, phone),
            address = COALESCE(?, address),
            avatar_url = COALESCE(?, avatar_url),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&req.name)
    .bind(&req.email)
    .bind(&req.username)
    .bind(&req.phone)
    .bind(&req.address)
    .bind(&req.avatar_url)
    .bind(&now)
    .bind(&id)
    .execute(&state.db)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.message().contains("UNIQUE constraint failed") => {
            ApiError::conflict("Email or username is already taken")
        }
        _ => e.into(),
    })?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(ok(UserResponse::from(user)))
}

/// POST /users/:id/password
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    caller: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    require_self_or_admin(&caller, &id)?;
    validate_password(&req.password).map_err(ApiError::bad_request)?;

    let password_hash = auth::hash_password(&req.password)
        .map_err(|e| ApiError::internal(format!("Failed to hash password: {}", e)))?;
    let now = chrono::Utc::now().to_rfc3339();

    let result = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
        .bind(&password_hash)
        .bind(&now)
        .bind(&id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("User not found"));
    }

    Ok(ok(json!({ "message": "Password updated" })))
}

/// DELETE /users/:id (admin)
///
/// Deletion is immediate and unconditional; the user's orders stay behind.
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(&id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&id)
        .execute(&state.db)
        .await?;

    tracing::info!(user = %user.username, "User deleted");
    Ok(ok(UserResponse::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::orders;
    use crate::cart::{Cart, ShippingDetails};
    use crate::config::Config;
    use crate::db::Product;

    async fn test_state() -> Arc<AppState> {
        let db = crate::db::connect("sqlite::memory:").await.expect("pool");
        Arc::new(AppState::new(Config::default(), db))
    }

    fn register_request() -> RegisterRequest {
        RegisterRequest {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            username: "a1".to_string(),
            phone: "0700000000".to_string(),
            password: "Aa1!aaaa".to_string(),
            address: None,
        }
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_identifier_are_indistinguishable() {
        let state = test_state().await;
        register(State(state.clone()), Json(register_request()))
            .await
            .unwrap();

        let wrong_password = login(
            State(state.clone()),
            Json(LoginRequest {
                identifier: "a1".to_string(),
                password: "not-the-password1".to_string(),
            }),
        )
        .await
        .unwrap_err();

        let unknown_account = login(
            State(state),
            Json(LoginRequest {
                identifier: "ghost".to_string(),
                password: "Aa1!aaaa".to_string(),
            }),
        )
        .await
        .unwrap_err();

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.status(), unknown_account.status());
        assert_eq!(wrong_password.message(), unknown_account.message());
    }

    #[tokio::test]
    async fn register_login_checkout_scenario() {
        let state = test_state().await;

        let (status, Json(created)) = register(State(state.clone()), Json(register_request()))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        let body = serde_json::to_string(&created).unwrap();
        assert!(!body.contains("password"));

        let Json(logged_in) = login(
            State(state.clone()),
            Json(LoginRequest {
                identifier: "a1".to_string(),
                password: "Aa1!aaaa".to_string(),
            }),
        )
        .await
        .unwrap();
        let claims = auth::verify_token(
            &state.config.auth.jwt_secret,
            &logged_in.data.token,
            auth::PURPOSE_SESSION,
        )
        .unwrap();
        assert_eq!(claims.sub, created.data.id);

        sqlx::query("INSERT INTO products (id, name, price) VALUES ('p1', 'Runner', 1000)")
            .execute(&state.db)
            .await
            .unwrap();
        let product: Product = sqlx::query_as("SELECT * FROM products WHERE id = 'p1'")
            .fetch_one(&state.db)
            .await
            .unwrap();

        let mut cart = Cart::new();
        cart.add_line(&product, "42");
        cart.add_line(&product, "42");
        let req = cart
            .checkout(
                &claims.sub,
                &ShippingDetails {
                    name: "A".to_string(),
                    email: "a@x.com".to_string(),
                    phone: "0700000000".to_string(),
                    address: "Street 1".to_string(),
                },
            )
            .unwrap();

        let caller = AuthUser {
            id: claims.sub.clone(),
            role: claims.role.clone(),
        };
        let (status, Json(order)) = orders::create_order(State(state), caller, Json(req))
            .await
            .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(order.data.total, 2000);
        assert_eq!(order.data.status, "pending");
        assert_eq!(order.data.items.len(), 1);
        assert_eq!(order.data.items[0].quantity, 2);
    }
}
