use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::objects::PaymentStatus;

/// Request payload for enrolling in a free course directly.
///
/// Sent by the learner's frontend to `POST /enrollments`. Paid courses are
/// rejected on this path; they must go through checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnrollFreeRequest {
    pub course_id: Uuid,
}

/// One enrollment with its course summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentSummary {
    /// Internal enrollment ID (UUID).
    pub enrollment_id: Uuid,
    pub course_id: Uuid,
    pub course_title: String,
    pub thumbnail: Option<String>,
    pub payment_status: PaymentStatus,
    /// Amount actually paid, in major units. Zero for free enrollments.
    pub payment_amount: rust_decimal::Decimal,
    /// Completion progress in percent (0–100).
    pub progress: i32,
    /// Unix timestamp of when the enrollment was created.
    pub enrolled_at: i64,
}

/// Response returned by `GET /enrollments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentListResponse {
    pub enrollments: Vec<EnrollmentSummary>,
}

/// One completed (or refunded) purchase, returned by `GET /purchases`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseRecord {
    pub reference: CompactString,
    pub amount: rust_decimal::Decimal,
    pub currency: CompactString,
    pub status: PaymentStatus,
    pub course_id: Uuid,
    pub course_title: String,
    pub thumbnail: Option<String>,
    /// Unix timestamp of when the payment was created.
    pub created_at: i64,
}

/// Response returned by `GET /purchases`, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseListResponse {
    pub purchases: Vec<PurchaseRecord>,
}
