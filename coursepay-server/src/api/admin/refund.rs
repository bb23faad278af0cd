use axum::{
    Json,
    extract::{Path, State},
};
use coursepay_core::framework::DatabaseProcessor;
use coursepay_core::ledger::LedgerStore;
use coursepay_sdk::objects::PaymentStatus;
use coursepay_sdk::objects::admin::AdminPaymentActionResponse;

use super::AdminApiError;
use crate::api::extractors::AdminAuth;
use crate::state::AppState;

/// `POST /admin/payments/{reference}/refund` — mark a completed payment
/// refunded and downgrade its enrollment, atomically.
///
/// The money movement itself happens in the gateway dashboard; this
/// records the outcome and revokes course access.
pub(super) async fn refund_payment(
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

    if !store.refund(&reference).await? {
        return Err(AdminApiError::NotRefundable);
    }
    tracing::info!(reference = %reference, "payment refunded and enrollment downgraded");

    Ok(Json(AdminPaymentActionResponse {
        reference: reference.into(),
        status: PaymentStatus::Refunded,
    }))
}
