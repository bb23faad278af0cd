use axum::{Json, extract::State};
use coursepay_core::entities::orphaned_confirmation::ListUnresolvedOrphans;
use coursepay_core::framework::DatabaseProcessor;
use coursepay_sdk::objects::admin::{AdminOrphanResponse, ListOrphansResponse};
use kanau::processor::Processor;

use super::AdminApiError;
use crate::api::extractors::AdminAuth;
use crate::state::AppState;

const ORPHAN_LIMIT: i64 = 100;

/// `GET /admin/orphans` — unresolved gateway confirmations that matched
/// no ledger entry, newest first.
pub(super) async fn list_orphans(
    State(state): State<AppState>,
    _auth: AdminAuth,
) -> Result<Json<ListOrphansResponse>, AdminApiError> {
    let db = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let records = db
        .process(ListUnresolvedOrphans {
            limit: ORPHAN_LIMIT,
        })
        .await
        .map_err(AdminApiError::Database)?;

    let orphans = records
        .into_iter()
        .map(|record| AdminOrphanResponse {
            id: record.id,
            reference: record.reference.into(),
            event_type: record.event_type.into(),
            payload: record.payload,
            received_at: record.received_at.assume_utc().unix_timestamp(),
        })
        .collect();

    Ok(Json(ListOrphansResponse { orphans }))
}
