//! Learner payment endpoints.
//!
//! All endpoints require a bearer session token.
//!
//! # Endpoints
//!
//! - `POST /payments/initialize`       – start a paid checkout
//! - `POST /payments/verify`           – confirm a charge after redirect
//! - `POST /payments/coupons/validate` – pre-check a discount code
//! - `GET  /purchases`                 – purchase history, newest first

use axum::{
    Router,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use coursepay_core::checkout::CheckoutError;
use coursepay_core::gateway::GatewayError;
use coursepay_core::ledger::LedgerError;
use coursepay_core::reconciler::ReconcileError;

use crate::state::AppState;

mod coupons;
mod initialize;
mod purchases;
mod verify;

/// Build the learner payment router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payments/initialize", post(initialize::initialize_payment))
        .route("/payments/verify", post(verify::verify_payment))
        .route(
            "/payments/coupons/validate",
            post(coupons::validate_coupon),
        )
        .route("/purchases", get(purchases::list_purchases))
}

// ---------------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------------

/// Errors that can occur in learner payment and enrollment handlers.
#[derive(Debug)]
pub(crate) enum PaymentApiError {
    /// The course does not exist or is not published.
    CourseNotFound,
    /// The caller already holds a completed enrollment for this course.
    AlreadyEnrolled,
    /// Free-path request for a course with a nonzero price.
    CourseNotFree,
    /// Reference allocation collided; the client should retry checkout.
    ReferenceCollision,
    /// The payable amount cannot be represented in gateway minor units.
    AmountOutOfRange,
    /// No ledger entry matches the reference (or it belongs to another user).
    PaymentNotFound,
    /// The charge settled unsuccessfully.
    PaymentFailed,
    /// A successful confirmation could not be applied to the ledger.
    Unreconciled,
    /// The gateway call failed.
    Gateway(GatewayError),
    /// A database query failed.
    Database(sqlx::Error),
}

impl From<LedgerError> for PaymentApiError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::ReferenceCollision => PaymentApiError::ReferenceCollision,
            LedgerError::Database(e) => PaymentApiError::Database(e),
        }
    }
}

impl From<CheckoutError> for PaymentApiError {
    fn from(error: CheckoutError) -> Self {
        match error {
            CheckoutError::CourseNotFound => PaymentApiError::CourseNotFound,
            CheckoutError::AlreadyEnrolled => PaymentApiError::AlreadyEnrolled,
            CheckoutError::CourseNotFree => PaymentApiError::CourseNotFree,
            CheckoutError::ReferenceCollision => PaymentApiError::ReferenceCollision,
            CheckoutError::AmountOutOfRange => PaymentApiError::AmountOutOfRange,
            CheckoutError::Gateway(e) => PaymentApiError::Gateway(e),
            CheckoutError::Store(e) => e.into(),
        }
    }
}

impl From<ReconcileError> for PaymentApiError {
    fn from(error: ReconcileError) -> Self {
        match error {
            ReconcileError::Gateway(e) => PaymentApiError::Gateway(e),
            ReconcileError::Store(e) => e.into(),
            ReconcileError::CourseMissing { .. } => PaymentApiError::Unreconciled,
        }
    }
}

impl IntoResponse for PaymentApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            PaymentApiError::CourseNotFound => {
                (StatusCode::NOT_FOUND, "course not found").into_response()
            }
            PaymentApiError::AlreadyEnrolled => {
                (StatusCode::CONFLICT, "already enrolled in this course").into_response()
            }
            PaymentApiError::CourseNotFree => (
                StatusCode::BAD_REQUEST,
                "course is not free, use checkout instead",
            )
                .into_response(),
            PaymentApiError::ReferenceCollision => (
                StatusCode::SERVICE_UNAVAILABLE,
                "could not allocate a transaction reference, retry checkout",
            )
                .into_response(),
            PaymentApiError::AmountOutOfRange => {
                (StatusCode::BAD_REQUEST, "amount cannot be charged").into_response()
            }
            PaymentApiError::PaymentNotFound => {
                (StatusCode::NOT_FOUND, "payment not found").into_response()
            }
            PaymentApiError::PaymentFailed => {
                (StatusCode::BAD_REQUEST, "payment failed").into_response()
            }
            PaymentApiError::Unreconciled => {
                tracing::error!("successful confirmation could not be applied");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "payment could not be reconciled",
                )
                    .into_response()
            }
            PaymentApiError::Gateway(GatewayError::NotFound { reference }) => {
                tracing::info!(reference = %reference, "gateway has no such transaction");
                (StatusCode::NOT_FOUND, "transaction not found at gateway").into_response()
            }
            PaymentApiError::Gateway(e) => {
                tracing::warn!(error = %e, "gateway call failed");
                (StatusCode::BAD_GATEWAY, "payment gateway error").into_response()
            }
            PaymentApiError::Database(e) => {
                tracing::error!(error = %e, "payment API database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
