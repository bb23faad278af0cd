//! Custom Axum extractors for request authentication.
//!
//! Provides:
//! - `AuthSession` — resolves the bearer `Authorization` token to a
//!   [`SessionUser`] through the session store (learner endpoints).
//! - `AdminAuth` — verifies the `x-admin-secret` header against the
//!   argon2 hash in the runtime config (operator endpoints).

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use coursepay_core::entities::session::{GetSessionUser, SessionUser};
use coursepay_core::framework::DatabaseProcessor;
use coursepay_sdk::objects::ADMIN_SECRET_HEADER;
use kanau::processor::Processor;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// AuthSession — learner authentication via bearer session token
// ---------------------------------------------------------------------------

/// The authenticated learner, resolved from a session token.
///
/// # Header format
///
/// ```text
/// Authorization: Bearer {session_token}
/// ```
pub struct AuthSession(pub SessionUser);

/// Errors returned by the [`AuthSession`] extractor.
#[derive(Debug)]
pub enum AuthError {
    /// The `Authorization` header is missing or not a bearer token.
    MissingToken,
    /// The token matches no unexpired session.
    InvalidToken,
    /// The session lookup itself failed.
    Database(sqlx::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::MissingToken => {
                (StatusCode::UNAUTHORIZED, "missing bearer token").into_response()
            }
            AuthError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "invalid or expired session").into_response()
            }
            AuthError::Database(e) => {
                tracing::error!(error = %e, "session lookup failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}

impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or(AuthError::MissingToken)?
            .to_owned();

        let db = DatabaseProcessor {
            pool: state.db.clone(),
        };
        let user = db
            .process(GetSessionUser { token })
            .await
            .map_err(AuthError::Database)?
            .ok_or(AuthError::InvalidToken)?;

        Ok(AuthSession(user))
    }
}

// ---------------------------------------------------------------------------
// AdminAuth — operator authentication via shared secret header
// ---------------------------------------------------------------------------

/// Proof that the request carried the operator secret.
///
/// # Header format
///
/// ```text
/// x-admin-secret: {plaintext_secret}
/// ```
///
/// The secret is verified against the argon2 hash held in the reloadable
/// admin config.
pub struct AdminAuth;

/// Errors returned by the [`AdminAuth`] extractor.
#[derive(Debug)]
pub enum AdminAuthError {
    MissingSecret,
    InvalidSecret,
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        match self {
            AdminAuthError::MissingSecret => {
                (StatusCode::UNAUTHORIZED, "missing x-admin-secret header").into_response()
            }
            AdminAuthError::InvalidSecret => {
                (StatusCode::UNAUTHORIZED, "invalid admin secret").into_response()
            }
        }
    }
}

impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = AdminAuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let secret = parts
            .headers
            .get(ADMIN_SECRET_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or(AdminAuthError::MissingSecret)?;

        let admin = state.config.admin.read().await;
        if !admin.verify_secret(secret) {
            drop(admin);
            tracing::warn!("rejected admin request with invalid secret");
            return Err(AdminAuthError::InvalidSecret);
        }

        Ok(AdminAuth)
    }
}
