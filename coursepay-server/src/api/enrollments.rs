//! Learner enrollment endpoints.
//!
//! # Endpoints
//!
//! - `POST /enrollments` – enroll directly in a free course
//! - `GET  /enrollments` – list the caller's enrollments

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use coursepay_core::checkout;
use coursepay_core::entities::enrollment::ListEnrollmentsForUser;
use coursepay_core::framework::DatabaseProcessor;
use coursepay_core::ledger::LedgerStore;
use coursepay_sdk::objects::enrollment::{
    EnrollFreeRequest, EnrollmentListResponse, EnrollmentSummary,
};
use kanau::processor::Processor;

use super::extractors::AuthSession;
use super::payments::PaymentApiError;
use crate::state::AppState;

/// Build the enrollment router.
pub fn router() -> Router<AppState> {
    Router::new().route("/enrollments", post(enroll_free).get(list_enrollments))
}

/// `POST /enrollments` — direct enrollment for a zero-price course.
///
/// Paid courses are rejected here; they must go through checkout, so a
/// forged "free" request cannot bypass payment.
async fn enroll_free(
    State(state): State<AppState>,
    AuthSession(user): AuthSession,
    Json(req): Json<EnrollFreeRequest>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let store = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let enrollment = checkout::enroll_free(&store, user.user_id, req.course_id).await?;
    let course = store
        .course_detail(req.course_id)
        .await?
        .ok_or(PaymentApiError::CourseNotFound)?;

    let summary = EnrollmentSummary {
        enrollment_id: enrollment.id,
        course_id: enrollment.course_id,
        course_title: course.title,
        thumbnail: course.thumbnail,
        payment_status: enrollment.payment_status.into(),
        payment_amount: enrollment.payment_amount,
        progress: enrollment.progress,
        enrolled_at: enrollment.enrolled_at.assume_utc().unix_timestamp(),
    };
    Ok((StatusCode::CREATED, Json(summary)))
}

/// `GET /enrollments` — the caller's enrollments joined with course
/// summaries, newest first.
async fn list_enrollments(
    State(state): State<AppState>,
    AuthSession(user): AuthSession,
) -> Result<Json<EnrollmentListResponse>, PaymentApiError> {
    let db = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let rows = db
        .process(ListEnrollmentsForUser {
            user_id: user.user_id,
        })
        .await
        .map_err(PaymentApiError::Database)?;

    let enrollments = rows
        .into_iter()
        .map(|row| EnrollmentSummary {
            enrollment_id: row.id,
            course_id: row.course_id,
            course_title: row.course_title,
            thumbnail: row.thumbnail,
            payment_status: row.payment_status.into(),
            payment_amount: row.payment_amount,
            progress: row.progress,
            enrolled_at: row.enrolled_at.assume_utc().unix_timestamp(),
        })
        .collect();

    Ok(Json(EnrollmentListResponse { enrollments }))
}
