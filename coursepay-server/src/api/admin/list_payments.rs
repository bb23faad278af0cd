use axum::{
    Json,
    extract::{Query, State},
};
use coursepay_core::entities::payment::{ListPayments, PaymentRecord};
use coursepay_core::framework::DatabaseProcessor;
use coursepay_sdk::objects::admin::{
    AdminPaymentResponse, ListPaymentsQuery, ListPaymentsResponse, clamp_pagination,
};
use kanau::processor::Processor;

use super::AdminApiError;
use crate::api::extractors::AdminAuth;
use crate::state::AppState;

/// `GET /admin/payments` — list ledger entries with optional filters.
///
/// `status=pending` is the reconciliation-needed view: payments that never
/// received a successful gateway confirmation.
pub(super) async fn list_payments(
    State(state): State<AppState>,
    _auth: AdminAuth,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<Json<ListPaymentsResponse>, AdminApiError> {
    let (limit, offset) = clamp_pagination(query.limit, query.offset);

    let db = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let records = db
        .process(ListPayments {
            status: query.status.map(Into::into),
            user_id: query.user_id,
            course_id: query.course_id,
            limit,
            offset,
        })
        .await
        .map_err(AdminApiError::Database)?;

    Ok(Json(ListPaymentsResponse {
        payments: records.iter().map(to_response).collect(),
    }))
}

/// Convert a `PaymentRecord` (DB model) into an `AdminPaymentResponse`
/// (API model).
pub(super) fn to_response(record: &PaymentRecord) -> AdminPaymentResponse {
    AdminPaymentResponse {
        id: record.id,
        reference: record.reference.clone().into(),
        amount: record.amount,
        currency: record.currency.clone().into(),
        status: record.status.into(),
        payment_method: record.payment_method.clone().map(Into::into),
        user_id: record.user_id,
        course_id: record.course_id,
        created_at: record.created_at.assume_utc().unix_timestamp(),
        updated_at: record.updated_at.assume_utc().unix_timestamp(),
    }
}
