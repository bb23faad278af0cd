pub mod admin;
pub mod checkout;
pub mod coupon;
pub mod enrollment;

use serde::{Deserialize, Serialize};

/// Header carrying the operator secret on admin API requests.
pub const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

/// Payment status as exposed over the API.
///
/// This is the serde version. For database operations, see the
/// `sqlx::Type` enum in `coursepay-core`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        };
        f.write_str(s)
    }
}

/// How a coupon's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `discount_value` is a percentage of the unit price (0–100).
    Percentage,
    /// `discount_value` is an absolute amount in the course currency.
    Fixed,
}

impl std::fmt::Display for DiscountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DiscountType::Percentage => "percentage",
            DiscountType::Fixed => "fixed",
        };
        f.write_str(s)
    }
}
