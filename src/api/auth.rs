//! Password hashing, token issuance and request authentication.
//!
//! Tokens are stateless signed JWTs carrying the user id and role. Session
//! tokens live for one day; password-reset tokens for fifteen minutes and
//! carry a distinct purpose claim so one kind can never stand in for the
//! other.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::ApiError;
use crate::db::DbPool;
use crate::AppState;

/// Session token lifetime: one day
const SESSION_TTL_SECS: i64 = 24 * 60 * 60;
/// Password-reset token lifetime: fifteen minutes
const RESET_TTL_SECS: i64 = 15 * 60;

pub const PURPOSE_SESSION: &str = "session";
pub const PURPOSE_RESET: &str = "reset";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub role: String,
    pub purpose: String,
    /// Expiry as a unix timestamp
    pub exp: i64,
}

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2.hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

fn issue_token(secret: &str, user_id: &str, role: &str, purpose: &str, ttl_secs: i64) -> Result<String, ApiError> {
    let claims = Claims {
        sub: user_id.to_string(),
        role: role.to_string(),
        purpose: purpose.to_string(),
        exp: chrono::Utc::now().timestamp() + ttl_secs,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::internal(format!("Failed to sign token: {}", e)))
}

/// Issue a one-day session token embedding the user id and role.
pub fn issue_session_token(secret: &str, user_id: &str, role: &str) -> Result<String, ApiError> {
    issue_token(secret, user_id, role, PURPOSE_SESSION, SESSION_TTL_SECS)
}

/// Issue a fifteen-minute password-reset token.
pub fn issue_reset_token(secret: &str, user_id: &str) -> Result<String, ApiError> {
    issue_token(secret, user_id, "user", PURPOSE_RESET, RESET_TTL_SECS)
}

/// Decode and verify a token, checking signature, expiry and purpose.
/// Expired or tampered tokens fail closed with a generic error.
pub fn verify_token(secret: &str, token: &str, purpose: &str) -> Result<Claims, ApiError> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::unauthorized("Invalid or expired token"))?;

    if data.claims.purpose != purpose {
        return Err(ApiError::unauthorized("Invalid or expired token"));
    }
    Ok(data.claims)
}

/// Authenticated caller, decoded from the bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub role: String,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token =
            bearer_token(parts).ok_or_else(|| ApiError::unauthorized("Missing bearer token"))?;
        let claims = verify_token(&state.config.auth.jwt_secret, token, PURPOSE_SESSION)?;
        Ok(AuthUser {
            id: claims.sub,
            role: claims.role,
        })
    }
}

/// Extractor gating admin-only endpoints. Rejects non-admin callers with 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::forbidden("Admin access required"));
        }
        Ok(AdminUser(user))
    }
}

/// Ensure the configured admin account exists, creating it on first start.
pub async fn ensure_admin_user(
    pool: &DbPool,
    admin_email: &str,
    admin_password: &Option<String>,
) -> anyhow::Result<()> {
    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM users WHERE email = ?")
        .bind(admin_email)
        .fetch_optional(pool)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let password = match admin_password {
        Some(p) => p.clone(),
        None => {
            let generated = uuid::Uuid::new_v4().to_string();
            tracing::warn!("No admin password configured; generated one: {}", generated);
            generated
        }
    };

    let id = uuid::Uuid::new_v4().to_string();
    let password_hash =
        hash_password(&password).map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO users (id, name, email, username, phone, password_hash, role, created_at, updated_at)
         VALUES (?, ?, ?, ?, '', ?, 'admin', ?, ?)",
    )
    .bind(&id)
    .bind("Administrator")
    .bind(admin_email)
    .bind("admin")
    .bind(&password_hash)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    tracing::info!("Created admin user {}", admin_email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("Aa1!aaaa").unwrap();
        assert_ne!(hash, "Aa1!aaaa");
        assert!(verify_password("Aa1!aaaa", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn session_token_round_trip() {
        let token = issue_session_token("secret", "u1", "user").unwrap();
        let claims = verify_token("secret", &token, PURPOSE_SESSION).unwrap();
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.role, "user");
    }

    #[test]
    fn tampered_token_fails_closed() {
        let token = issue_session_token("secret", "u1", "user").unwrap();
        let mut tampered = token.clone();
        tampered.push('x');
        assert!(verify_token("secret", &tampered, PURPOSE_SESSION).is_err());
        assert!(verify_token("other-secret", &token, PURPOSE_SESSION).is_err());
    }

    #[test]
    fn session_token_cannot_reset_a_password() {
        let token = issue_session_token("secret", "u1", "admin").unwrap();
        assert!(verify_token("secret", &token, PURPOSE_RESET).is_err());
    }

    #[test]
    fn reset_token_cannot_open_a_session() {
        let token = issue_reset_token("secret", "u1").unwrap();
        assert!(verify_token("secret", &token, PURPOSE_SESSION).is_err());
        assert!(verify_token("secret", &token, PURPOSE_RESET).is_ok());
    }

    #[test]
    fn expired_token_is_rejected() {
        let claims = Claims {
            sub: "u1".to_string(),
            role: "user".to_string(),
            purpose: PURPOSE_SESSION.to_string(),
            exp: chrono::Utc::now().timestamp() - 120,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(verify_token("secret", &token, PURPOSE_SESSION).is_err());
    }
}
