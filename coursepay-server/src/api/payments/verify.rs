use axum::{Json, extract::State, response::IntoResponse};
use coursepay_core::framework::DatabaseProcessor;
use coursepay_core::ledger::LedgerStore;
use coursepay_core::reconciler::{self, Channel, ReconcileOutcome};
use coursepay_sdk::objects::checkout::{VerifyPaymentRequest, VerifyPaymentResponse};

use super::PaymentApiError;
use crate::api::extractors::AuthSession;
use crate::state::AppState;

/// `POST /payments/verify` — pull the charge status from the gateway and
/// reconcile it into the ledger.
///
/// The browser supplies only the reference; everything else is re-derived
/// from the gateway. Safe to call repeatedly.
pub(super) async fn verify_payment(
    State(state): State<AppState>,
    AuthSession(user): AuthSession,
    Json(req): Json<VerifyPaymentRequest>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let store = DatabaseProcessor {
        pool: state.db.clone(),
    };

    // Only the buyer may verify their own reference; anything else reads
    // as not found so references cannot be probed.
    let payment = store
        .payment_by_reference(&req.reference)
        .await?
        .ok_or(PaymentApiError::PaymentNotFound)?;
    if payment.user_id != user.user_id {
        return Err(PaymentApiError::PaymentNotFound);
    }

    let outcome = reconciler::verify_and_reconcile(
        &store,
        &*state.gateway,
        &req.reference,
        state.verify_timeout,
        Channel::ClientVerify,
    )
    .await?;

    let response = match outcome {
        ReconcileOutcome::Completed(completed) => VerifyPaymentResponse::Success {
            enrollment_id: completed.enrollment.id,
            course_id: completed.course.id,
            course_title: completed.course.title,
            instructor: completed.course.instructor_name,
            thumbnail: completed.course.thumbnail,
            price: completed.amount,
        },
        ReconcileOutcome::Pending { reference } => VerifyPaymentResponse::Pending {
            reference: reference.into(),
        },
        ReconcileOutcome::Failed { .. } => return Err(PaymentApiError::PaymentFailed),
        ReconcileOutcome::Quarantined { .. } | ReconcileOutcome::Ignored { .. } => {
            return Err(PaymentApiError::Unreconciled);
        }
    };
    Ok(Json(response))
}
