//! Admin API request and response types.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PaymentStatus;

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Full ledger entry detail for the admin API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminPaymentResponse {
    pub id: Uuid,
    pub reference: CompactString,
    pub amount: rust_decimal::Decimal,
    pub currency: CompactString,
    pub status: PaymentStatus,
    pub payment_method: Option<CompactString>,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Response of the manual reconcile and refund endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminPaymentActionResponse {
    pub reference: CompactString,
    /// Ledger status after the action was applied.
    pub status: PaymentStatus,
}

/// A gateway confirmation that matched no ledger entry, held for review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminOrphanResponse {
    pub id: Uuid,
    pub reference: CompactString,
    pub event_type: CompactString,
    pub payload: serde_json::Value,
    pub received_at: i64,
}

/// Response returned by `GET /admin/payments`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPaymentsResponse {
    pub payments: Vec<AdminPaymentResponse>,
}

/// Response returned by `GET /admin/orphans`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListOrphansResponse {
    pub orphans: Vec<AdminOrphanResponse>,
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

const DEFAULT_LIMIT: i64 = 20;
const MAX_LIMIT: i64 = 200;
const MAX_OFFSET: i64 = 100_000;

/// Query parameters for listing ledger entries.
///
/// `status=pending` is the reconciliation-needed view: payments that never
/// received a successful gateway confirmation.
#[derive(Debug, Clone, Deserialize)]
pub struct ListPaymentsQuery {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    pub status: Option<PaymentStatus>,
    pub user_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
}

fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

/// Clamp limit and offset to safe maximums.
pub fn clamp_pagination(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_LIMIT), offset.clamp(0, MAX_OFFSET))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_is_clamped() {
        assert_eq!(clamp_pagination(0, -5), (1, 0));
        assert_eq!(clamp_pagination(5_000, 200), (MAX_LIMIT, 200));
        assert_eq!(clamp_pagination(20, 1_000_000), (20, MAX_OFFSET));
    }

    #[test]
    fn list_query_defaults_apply() {
        let q: ListPaymentsQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.limit, DEFAULT_LIMIT);
        assert_eq!(q.offset, 0);
        assert!(q.status.is_none());
    }
}
