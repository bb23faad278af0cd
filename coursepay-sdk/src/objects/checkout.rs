use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Request payload for starting a paid checkout.
///
/// Sent by the learner's frontend to `POST /payments/initialize`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InitializePaymentRequest {
    pub course_id: Uuid,
    /// Optional discount code, validated server-side against the course.
    #[serde(default)]
    pub coupon_code: Option<CompactString>,
    /// Where the gateway should send the buyer after payment. Must match
    /// one of the server's allowed origins or the configured default
    /// callback is used instead.
    #[serde(default)]
    pub redirect_url: Option<String>,
}

/// Response returned by `POST /payments/initialize`.
///
/// Tagged by `status`: a paid course yields the gateway redirect and the
/// frontend later confirms the charge through `POST /payments/verify`; a
/// selection with nothing to charge (free course, or a coupon covering
/// the full price) is enrolled directly and never touches the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum InitializePaymentResponse {
    Success {
        /// Internal payment ID (UUID).
        transaction_id: Uuid,
        /// Gateway-hosted payment page to redirect the buyer to.
        authorization_url: String,
        /// Gateway access code for inline/popup checkout flows.
        access_code: CompactString,
        /// Unique transaction reference correlating this payment with the
        /// gateway's record of the same charge.
        reference: CompactString,
        /// Final payable amount after coupon application, in major units.
        amount: rust_decimal::Decimal,
        /// ISO currency code of the charge.
        currency: CompactString,
    },
    Enrolled {
        /// Internal enrollment ID (UUID).
        enrollment_id: Uuid,
        course_id: Uuid,
    },
}

/// Request payload for confirming a charge after the gateway redirect.
///
/// Sent by the learner's frontend to `POST /payments/verify`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    pub reference: CompactString,
}

/// Response returned by `POST /payments/verify`.
///
/// Tagged by `status`: a settled successful charge yields the enrollment
/// summary, an unsettled one yields `pending` and the frontend should
/// poll again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum VerifyPaymentResponse {
    Success {
        enrollment_id: Uuid,
        course_id: Uuid,
        course_title: String,
        /// Display name of the course instructor.
        instructor: String,
        thumbnail: Option<String>,
        /// Amount actually charged by the gateway, in major units.
        price: rust_decimal::Decimal,
    },
    Pending {
        reference: CompactString,
    },
}
