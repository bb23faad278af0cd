//! Admin API handlers.
//!
//! Operator endpoints, authenticated by the `x-admin-secret` header
//! verified against the argon2 hash in the runtime config.
//!
//! # Endpoints
//!
//! - `GET  /admin/payments`                        – list ledger entries
//! - `POST /admin/payments/{reference}/reconcile`  – re-drive gateway verification
//! - `POST /admin/payments/{reference}/refund`     – refund a completed payment
//! - `GET  /admin/orphans`                         – list quarantined confirmations

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use coursepay_core::gateway::GatewayError;
use coursepay_core::ledger::LedgerError;

use crate::state::AppState;

mod list_orphans;
mod list_payments;
mod reconcile;
mod refund;

/// Build the Admin API router. Nested under `/admin`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payments", get(list_payments::list_payments))
        .route(
            "/payments/{reference}/reconcile",
            post(reconcile::reconcile_payment),
        )
        .route(
            "/payments/{reference}/refund",
            post(refund::refund_payment),
        )
        .route("/orphans", get(list_orphans::list_orphans))
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors that can occur in Admin API handlers.
#[derive(Debug)]
enum AdminApiError {
    /// No ledger entry matches the reference.
    PaymentNotFound,
    /// Refund requested for a payment that is not `completed`.
    NotRefundable,
    /// The gateway call failed.
    Gateway(GatewayError),
    /// The ledger store failed.
    Store(LedgerError),
    /// A database query failed.
    Database(sqlx::Error),
}

impl From<LedgerError> for AdminApiError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::Database(e) => AdminApiError::Database(e),
            other => AdminApiError::Store(other),
        }
    }
}

impl IntoResponse for AdminApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            AdminApiError::PaymentNotFound => {
                (StatusCode::NOT_FOUND, "payment not found").into_response()
            }
            AdminApiError::NotRefundable => {
                (StatusCode::CONFLICT, "payment is not completed").into_response()
            }
            AdminApiError::Gateway(GatewayError::NotFound { reference }) => {
                tracing::info!(reference = %reference, "gateway has no such transaction");
                (StatusCode::NOT_FOUND, "transaction not found at gateway").into_response()
            }
            AdminApiError::Gateway(e) => {
                tracing::warn!(error = %e, "gateway call failed");
                (StatusCode::BAD_GATEWAY, "payment gateway error").into_response()
            }
            AdminApiError::Store(e) => {
                tracing::error!(error = %e, "Admin API ledger error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
            AdminApiError::Database(e) => {
                tracing::error!(error = %e, "Admin API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
