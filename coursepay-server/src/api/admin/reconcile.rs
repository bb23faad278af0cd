use axum::{
    Json,
    extract::{Path, State},
};
use coursepay_core::framework::DatabaseProcessor;
use coursepay_core::ledger::LedgerStore;
use coursepay_core::reconciler::{self, Channel, ReconcileError};
use coursepay_sdk::objects::admin::AdminPaymentActionResponse;

use super::AdminApiError;
use crate::api::extractors::AdminAuth;
use crate::state::AppState;

/// `POST /admin/payments/{reference}/reconcile` — re-drive gateway
/// verification for a stuck reference.
///
/// Runs the same reconciliation as the client verify path; the response
/// reports the ledger status after the pass, whatever it concluded.
pub(super) async fn reconcile_payment(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Path(reference): Path<String>,
) -> Result<Json<AdminPaymentActionResponse>, AdminApiError> {
    let store = DatabaseProcessor {
        pool: state.db.clone(),
    };
    store
        .payment_by_reference(&reference)
        .await?
        .ok_or(AdminApiError::PaymentNotFound)?;

    let result = reconciler::verify_and_reconcile(
        &store,
        &*state.gateway,
        &reference,
        state.verify_timeout,
        Channel::AdminReconcile,
    )
    .await;
    match result {
        Ok(outcome) => {
            tracing::info!(reference = %reference, outcome = ?outcome, "manual reconciliation pass finished");
        }
        // The enrollment was written; only the course summary is missing,
        // and the admin response does not carry one.
        Err(ReconcileError::CourseMissing { course_id }) => {
            tracing::warn!(reference = %reference, course_id = %course_id, "completed payment references an unpublished course");
        }
        Err(ReconcileError::Gateway(e)) => return Err(AdminApiError::Gateway(e)),
        Err(ReconcileError::Store(e)) => return Err(e.into()),
    }

    // Report whatever the ledger says now rather than deriving a status
    // from the outcome.
    let payment = store
        .payment_by_reference(&reference)
        .await?
        .ok_or(AdminApiError::PaymentNotFound)?;

    Ok(Json(AdminPaymentActionResponse {
        reference: payment.reference.into(),
        status: payment.status.into(),
    }))
}
