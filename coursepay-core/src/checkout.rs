//! Checkout initiation and free-course enrollment.
//!
//! `initialize` takes the buyer from a course selection to a gateway
//! redirect: price the cart, create the `pending` ledger entry, then ask
//! the gateway for an authorization URL. The ledger entry exists before
//! the gateway is ever contacted, so a confirmation can always be matched
//! even if the buyer never returns.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::CheckoutConfig;
use crate::entities::course::CourseDetail;
use crate::entities::enrollment::EnrollmentRecord;
use crate::entities::payment::{CreatePendingPayment, PaymentRecord};
use crate::gateway::{GatewayAuthorization, GatewayError, InitializeTransaction, PaymentGateway};
use crate::ledger::{LedgerError, LedgerStore};
use crate::pricing::{self, CouponError, LineItem, Quote};
use crate::reference::generate_reference;

#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("course not found")]
    CourseNotFound,
    #[error("already enrolled in this course")]
    AlreadyEnrolled,
    /// Free-path guard: the targeted course has a nonzero price and must
    /// go through the gateway.
    #[error("course is not free")]
    CourseNotFree,
    /// The generated reference collided with an existing ledger entry.
    /// Safe to retry the whole checkout with a fresh reference.
    #[error("could not allocate a transaction reference, retry checkout")]
    ReferenceCollision,
    #[error("payable amount cannot be represented in gateway minor units")]
    AmountOutOfRange,
    /// Gateway initialization failed; the ledger entry was marked failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Store(LedgerError),
}

impl From<LedgerError> for CheckoutError {
    fn from(error: LedgerError) -> Self {
        match error {
            LedgerError::ReferenceCollision => CheckoutError::ReferenceCollision,
            other => CheckoutError::Store(other),
        }
    }
}

/// Checkout policy resolved from the runtime configuration.
#[derive(Debug, Clone)]
pub struct CheckoutPolicy {
    /// ISO currency code all charges are denominated in.
    pub currency: String,
    /// Redirect target used when the client supplies none, or one
    /// outside the allowed origins.
    pub default_callback_url: String,
    pub redirect: CheckoutConfig,
}

impl CheckoutPolicy {
    /// Pick the post-payment redirect: a client-supplied URL on an
    /// allowed origin wins, anything else falls back to the default.
    pub fn resolve_callback(&self, requested: Option<&str>) -> String {
        match requested {
            Some(url) if self.redirect.allows_redirect(url) => url.to_string(),
            Some(url) => {
                tracing::warn!(redirect_url = %url, "redirect origin not allowed, using default callback");
                self.default_callback_url.clone()
            }
            None => self.default_callback_url.clone(),
        }
    }
}

/// One checkout attempt, as received from the authenticated endpoint.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub user_id: Uuid,
    pub email: String,
    pub course_id: Uuid,
    pub coupon_code: Option<String>,
    pub redirect_url: Option<String>,
}

/// A `pending` ledger entry paired with the gateway redirect.
#[derive(Debug)]
pub struct CheckoutSession {
    pub payment: PaymentRecord,
    pub authorization: GatewayAuthorization,
    pub quote: Quote,
}

/// What checkout initiation produced.
#[derive(Debug)]
pub enum InitializeOutcome {
    /// Paid course: redirect the buyer to the gateway.
    Redirect(CheckoutSession),
    /// Nothing to charge: enrolled directly, gateway never contacted.
    Enrolled(EnrollmentRecord),
}

/// Initialize a checkout attempt for one course.
pub async fn initialize<S: LedgerStore + ?Sized>(
    store: &S,
    gateway: &dyn PaymentGateway,
    policy: &CheckoutPolicy,
    request: CheckoutRequest,
) -> Result<InitializeOutcome, CheckoutError> {
    let course = store
        .course_detail(request.course_id)
        .await?
        .ok_or(CheckoutError::CourseNotFound)?;
    ensure_not_enrolled(store, request.user_id, request.course_id).await?;

    let quote = quote_course(store, &course, request.coupon_code.as_deref()).await?;
    if let Some(error) = &quote.coupon_error {
        tracing::info!(course_id = %course.id, error = %error, "coupon rejected, charging full price");
    }

    // Nothing to charge: a free course, or a coupon covering the full
    // price. The gateway is never contacted.
    if quote.payable.is_zero() {
        let enrollment = store
            .upsert_free_enrollment(request.user_id, request.course_id)
            .await?;
        tracing::info!(user_id = %request.user_id, course_id = %request.course_id, "nothing to charge, enrolled directly");
        return Ok(InitializeOutcome::Enrolled(enrollment));
    }

    let amount_minor = crate::gateway::to_minor_units(quote.payable)
        .filter(|minor| *minor > 0)
        .ok_or(CheckoutError::AmountOutOfRange)?;

    let reference = generate_reference();
    let metadata = serde_json::json!({
        "course_id": course.id,
        "course_title": course.title,
        "user_id": request.user_id,
        "coupon_code": request.coupon_code,
    });

    let payment = store
        .create_pending(CreatePendingPayment {
            reference: reference.clone(),
            amount: quote.payable,
            currency: policy.currency.clone(),
            user_id: request.user_id,
            course_id: request.course_id,
            metadata: metadata.clone(),
        })
        .await?;
    tracing::info!(reference = %reference, amount = %quote.payable, course_id = %course.id, "created pending payment");

    let authorization = match gateway
        .initialize_transaction(InitializeTransaction {
            email: request.email,
            amount_minor_units: amount_minor,
            reference: reference.clone(),
            callback_url: policy.resolve_callback(request.redirect_url.as_deref()),
            currency: policy.currency.clone(),
            metadata,
        })
        .await
    {
        Ok(authorization) => authorization,
        Err(error) => {
            // The entry must not stay pending forever when the gateway
            // never learned the reference; the buyer retries with a new
            // one.
            tracing::warn!(reference = %reference, error = %error, "gateway initialize failed, marking payment failed");
            store.mark_failed(&reference).await?;
            return Err(CheckoutError::Gateway(error));
        }
    };

    Ok(InitializeOutcome::Redirect(CheckoutSession {
        payment,
        authorization,
        quote,
    }))
}

/// Price one course selection with an optional coupon code.
///
/// Billing picks the first non-free line; an all-free selection quotes to
/// zero and never consults the coupon. A code that matches no coupon
/// fails open exactly like any other rejected coupon: full price, with
/// the reason attached.
pub async fn quote_course<S: LedgerStore + ?Sized>(
    store: &S,
    course: &CourseDetail,
    coupon_code: Option<&str>,
) -> Result<Quote, CheckoutError> {
    let items = [LineItem {
        course_id: course.id,
        unit_price: course.price,
        is_free: course.is_free(),
    }];
    let Some(item) = pricing::first_billable(&items) else {
        return Ok(Quote::undiscounted(Decimal::ZERO));
    };
    let now = crate::entities::now_utc();

    let Some(code) = coupon_code else {
        return Ok(pricing::quote(item, None, now));
    };
    match store.coupon_by_code(code).await? {
        Some(coupon) => Ok(pricing::quote(item, Some(&coupon), now)),
        None => Ok(pricing::quote(item, None, now).with_coupon_error(CouponError::NotFound)),
    }
}

/// Enroll directly in a zero-price course.
///
/// Rejects a nonzero-price course so a forged "free" request cannot
/// bypass payment.
pub async fn enroll_free<S: LedgerStore + ?Sized>(
    store: &S,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<EnrollmentRecord, CheckoutError> {
    let course = store
        .course_detail(course_id)
        .await?
        .ok_or(CheckoutError::CourseNotFound)?;
    if !course.is_free() {
        return Err(CheckoutError::CourseNotFree);
    }
    ensure_not_enrolled(store, user_id, course_id).await?;

    let enrollment = store.upsert_free_enrollment(user_id, course_id).await?;
    tracing::info!(user_id = %user_id, course_id = %course_id, "free enrollment created");
    Ok(enrollment)
}

async fn ensure_not_enrolled<S: LedgerStore + ?Sized>(
    store: &S,
    user_id: Uuid,
    course_id: Uuid,
) -> Result<(), CheckoutError> {
    use crate::entities::PaymentStatus;

    // A refunded enrollment no longer grants access; buying again is
    // allowed and the upsert will overwrite it.
    match store.enrollment_for(user_id, course_id).await? {
        Some(enrollment) if enrollment.payment_status == PaymentStatus::Completed => {
            Err(CheckoutError::AlreadyEnrolled)
        }
        _ => Ok(()),
    }
}
