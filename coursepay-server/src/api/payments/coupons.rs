use axum::{Json, extract::State};
use coursepay_core::entities::now_utc;
use coursepay_core::framework::DatabaseProcessor;
use coursepay_core::ledger::LedgerStore;
use coursepay_core::pricing;
use coursepay_sdk::objects::coupon::{
    CouponSummary, CouponValidationRequest, CouponValidationResponse,
};

use super::PaymentApiError;
use crate::api::extractors::AuthSession;
use crate::state::AppState;

/// `POST /payments/coupons/validate` — pre-check a discount code against
/// a course before the buyer commits to checkout.
///
/// A rejected code is a normal response with `valid: false`, never an
/// error status; the only errors here are unknown courses and
/// infrastructure failures.
pub(super) async fn validate_coupon(
    State(state): State<AppState>,
    _session: AuthSession,
    Json(req): Json<CouponValidationRequest>,
) -> Result<Json<CouponValidationResponse>, PaymentApiError> {
    let store = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let course = store
        .course_detail(req.course_id)
        .await?
        .ok_or(PaymentApiError::CourseNotFound)?;

    let Some(coupon) = store.coupon_by_code(&req.code).await? else {
        return Ok(Json(CouponValidationResponse::invalid(
            pricing::CouponError::NotFound.to_string(),
        )));
    };

    let response = match pricing::coupon_discount(&coupon, course.id, course.price, now_utc()) {
        Ok(discount) => CouponValidationResponse {
            valid: true,
            discount_amount: Some(discount),
            payable_amount: Some(course.price - discount),
            coupon: Some(CouponSummary {
                code: coupon.code.into(),
                discount_type: coupon.discount_type.into(),
                discount_value: coupon.discount_value,
                minimum_amount: coupon.minimum_amount,
            }),
            reason: None,
        },
        Err(error) => CouponValidationResponse::invalid(error.to_string()),
    };
    Ok(Json(response))
}
