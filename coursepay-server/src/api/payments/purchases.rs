use axum::{Json, extract::State};
use coursepay_core::entities::payment::ListPurchasesForUser;
use coursepay_core::framework::DatabaseProcessor;
use coursepay_sdk::objects::enrollment::{PurchaseListResponse, PurchaseRecord};
use kanau::processor::Processor;

use super::PaymentApiError;
use crate::api::extractors::AuthSession;
use crate::state::AppState;

/// `GET /purchases` — the caller's completed and refunded payments joined
/// with course summaries, newest first.
pub(super) async fn list_purchases(
    State(state): State<AppState>,
    AuthSession(user): AuthSession,
) -> Result<Json<PurchaseListResponse>, PaymentApiError> {
    let db = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let rows = db
        .process(ListPurchasesForUser {
            user_id: user.user_id,
        })
        .await
        .map_err(PaymentApiError::Database)?;

    let purchases = rows
        .into_iter()
        .map(|row| PurchaseRecord {
            reference: row.reference.into(),
            amount: row.amount,
            currency: row.currency.into(),
            status: row.status.into(),
            course_id: row.course_id,
            course_title: row.course_title,
            thumbnail: row.thumbnail,
            created_at: row.created_at.assume_utc().unix_timestamp(),
        })
        .collect();

    Ok(Json(PurchaseListResponse { purchases }))
}
