use axum::{Json, extract::State, response::IntoResponse};
use coursepay_core::checkout::{self, CheckoutRequest, InitializeOutcome};
use coursepay_core::framework::DatabaseProcessor;
use coursepay_sdk::objects::checkout::{InitializePaymentRequest, InitializePaymentResponse};

use super::PaymentApiError;
use crate::api::extractors::AuthSession;
use crate::state::AppState;

/// `POST /payments/initialize` — price the course, create the pending
/// ledger entry and hand back the gateway redirect. A selection with
/// nothing to charge is enrolled directly instead.
pub(super) async fn initialize_payment(
    State(state): State<AppState>,
    AuthSession(user): AuthSession,
    Json(req): Json<InitializePaymentRequest>,
) -> Result<impl IntoResponse, PaymentApiError> {
    let store = DatabaseProcessor {
        pool: state.db.clone(),
    };
    let policy = state.checkout_policy().await;

    let outcome = checkout::initialize(
        &store,
        &*state.gateway,
        &policy,
        CheckoutRequest {
            user_id: user.user_id,
            email: user.email,
            course_id: req.course_id,
            coupon_code: req.coupon_code.map(|c| c.to_string()),
            redirect_url: req.redirect_url,
        },
    )
    .await?;

    let response = match outcome {
        InitializeOutcome::Redirect(session) => InitializePaymentResponse::Success {
            transaction_id: session.payment.id,
            authorization_url: session.authorization.authorization_url,
            access_code: session.authorization.access_code.into(),
            reference: session.payment.reference.into(),
            amount: session.payment.amount,
            currency: session.payment.currency.into(),
        },
        InitializeOutcome::Enrolled(enrollment) => InitializePaymentResponse::Enrolled {
            enrollment_id: enrollment.id,
            course_id: enrollment.course_id,
        },
    };
    Ok(Json(response))
}
