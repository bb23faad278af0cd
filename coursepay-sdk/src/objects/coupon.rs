use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::objects::DiscountType;

/// Request payload for pre-checking a discount code against a course.
///
/// Sent by the cart UI to `POST /payments/coupons/validate` before the
/// buyer commits to checkout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CouponValidationRequest {
    pub code: CompactString,
    pub course_id: Uuid,
}

/// Public view of a coupon, returned only for valid codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponSummary {
    pub code: CompactString,
    pub discount_type: DiscountType,
    pub discount_value: rust_decimal::Decimal,
    /// Minimum course price the coupon applies to.
    pub minimum_amount: rust_decimal::Decimal,
}

/// Response returned by `POST /payments/coupons/validate`.
///
/// `valid: false` carries a human-readable `reason`; a valid code carries
/// the computed discount and the resulting payable amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponValidationResponse {
    pub valid: bool,
    pub discount_amount: Option<rust_decimal::Decimal>,
    pub payable_amount: Option<rust_decimal::Decimal>,
    pub coupon: Option<CouponSummary>,
    pub reason: Option<String>,
}

impl CouponValidationResponse {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            discount_amount: None,
            payable_amount: None,
            coupon: None,
            reason: Some(reason.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn invalid_response_has_no_amounts() {
        let resp = CouponValidationResponse::invalid("coupon expired");
        let json = serde_json::to_string(&resp).unwrap();
        let back: CouponValidationResponse = serde_json::from_str(&json).unwrap();
        assert!(!back.valid);
        assert_eq!(back.reason.as_deref(), Some("coupon expired"));
        assert!(back.discount_amount.is_none());
    }

    #[test]
    fn valid_response_round_trips() {
        let resp = CouponValidationResponse {
            valid: true,
            discount_amount: Some(Decimal::new(1000, 0)),
            payable_amount: Some(Decimal::new(4000, 0)),
            coupon: Some(CouponSummary {
                code: "SAVE20".into(),
                discount_type: DiscountType::Percentage,
                discount_value: Decimal::new(20, 0),
                minimum_amount: Decimal::new(1000, 0),
            }),
            reason: None,
        };
        let json = serde_json::to_string(&resp).unwrap();
        let back: CouponValidationResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back, resp);
    }
}
