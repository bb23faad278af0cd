//! Test doubles: an in-memory [`LedgerStore`] and a programmable
//! [`PaymentGateway`], so checkout and reconciliation tests run without a
//! database or network.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::coupon::CouponRecord;
use crate::entities::course::CourseDetail;
use crate::entities::enrollment::EnrollmentRecord;
use crate::entities::payment::{CreatePendingPayment, PaymentRecord};
use crate::entities::{DiscountType, PaymentStatus, now_utc};
use crate::gateway::signature;
use crate::gateway::{
    GatewayAuthorization, GatewayConfirmation, GatewayError, GatewayTxStatus,
    InitializeTransaction, PaymentGateway, WebhookEvent,
};
use crate::ledger::{CompletePayment, LedgerError, LedgerStore};

#[derive(Debug, Clone, PartialEq)]
pub struct QuarantinedConfirmation {
    pub reference: String,
    pub event_type: String,
    pub payload: serde_json::Value,
}

/// In-memory [`LedgerStore`] mirroring the SQL semantics: unique
/// reference, mark-if-pending transitions, upsert keyed on
/// `(user_id, course_id)`.
#[derive(Default)]
pub struct InMemoryLedger {
    courses: Mutex<HashMap<Uuid, CourseDetail>>,
    coupons: Mutex<HashMap<String, CouponRecord>>,
    payments: Mutex<HashMap<String, PaymentRecord>>,
    enrollments: Mutex<HashMap<(Uuid, Uuid), EnrollmentRecord>>,
    orphans: Mutex<Vec<QuarantinedConfirmation>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_course(&self, title: &str, price: Decimal) -> Uuid {
        let id = Uuid::new_v4();
        self.courses.lock().unwrap().insert(
            id,
            CourseDetail {
                id,
                title: title.to_string(),
                price,
                thumbnail: None,
                instructor_name: "Ada Instructor".to_string(),
            },
        );
        id
    }

    pub fn add_percentage_coupon(&self, code: &str, percent: i64, minimum: Decimal) {
        self.add_coupon(code, DiscountType::Percentage, Decimal::new(percent, 0), minimum);
    }

    pub fn add_coupon(
        &self,
        code: &str,
        discount_type: DiscountType,
        value: Decimal,
        minimum: Decimal,
    ) {
        self.coupons.lock().unwrap().insert(
            code.to_uppercase(),
            CouponRecord {
                id: Uuid::new_v4(),
                code: code.to_string(),
                discount_type,
                discount_value: value,
                minimum_amount: minimum,
                course_id: None,
                is_active: true,
                starts_at: None,
                expires_at: None,
            },
        );
    }

    pub fn all_payments(&self) -> Vec<PaymentRecord> {
        self.payments.lock().unwrap().values().cloned().collect()
    }

    pub fn enrollment_count(&self) -> usize {
        self.enrollments.lock().unwrap().len()
    }

    pub fn orphans(&self) -> Vec<QuarantinedConfirmation> {
        self.orphans.lock().unwrap().clone()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn course_detail(&self, course_id: Uuid) -> Result<Option<CourseDetail>, LedgerError> {
        Ok(self.courses.lock().unwrap().get(&course_id).cloned())
    }

    async fn coupon_by_code(&self, code: &str) -> Result<Option<CouponRecord>, LedgerError> {
        Ok(self.coupons.lock().unwrap().get(&code.to_uppercase()).cloned())
    }

    async fn payment_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<PaymentRecord>, LedgerError> {
        Ok(self.payments.lock().unwrap().get(reference).cloned())
    }

    async fn enrollment_for(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<EnrollmentRecord>, LedgerError> {
        Ok(self
            .enrollments
            .lock()
            .unwrap()
            .get(&(user_id, course_id))
            .cloned())
    }

    async fn create_pending(
        &self,
        payment: CreatePendingPayment,
    ) -> Result<PaymentRecord, LedgerError> {
        let mut payments = self.payments.lock().unwrap();
        if payments.contains_key(&payment.reference) {
            return Err(LedgerError::ReferenceCollision);
        }
        let record = PaymentRecord {
            id: Uuid::new_v4(),
            reference: payment.reference.clone(),
            amount: payment.amount,
            currency: payment.currency,
            status: PaymentStatus::Pending,
            payment_method: None,
            metadata: payment.metadata,
            user_id: payment.user_id,
            course_id: payment.course_id,
            created_at: now_utc(),
            updated_at: now_utc(),
        };
        payments.insert(payment.reference, record.clone());
        Ok(record)
    }

    async fn mark_failed(&self, reference: &str) -> Result<bool, LedgerError> {
        let mut payments = self.payments.lock().unwrap();
        match payments.get_mut(reference) {
            Some(payment) if payment.status == PaymentStatus::Pending => {
                payment.status = PaymentStatus::Failed;
                payment.updated_at = now_utc();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn complete_and_enroll(
        &self,
        completion: CompletePayment,
    ) -> Result<Option<EnrollmentRecord>, LedgerError> {
        {
            let mut payments = self.payments.lock().unwrap();
            let Some(payment) = payments.get_mut(&completion.reference) else {
                return Ok(None);
            };
            if payment.status == PaymentStatus::Pending {
                payment.status = PaymentStatus::Completed;
                payment.payment_method = completion.payment_method.clone();
                payment.metadata = completion.gateway_payload.clone();
                payment.updated_at = now_utc();
            }
            if payment.status != PaymentStatus::Completed {
                return Ok(None);
            }
        }

        Ok(Some(self.upsert(
            completion.user_id,
            completion.course_id,
            Some(completion.reference),
            completion.amount,
            completion.paid_at,
        )))
    }

    async fn upsert_free_enrollment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<EnrollmentRecord, LedgerError> {
        Ok(self.upsert(user_id, course_id, None, Decimal::ZERO, None))
    }

    async fn quarantine_confirmation(
        &self,
        reference: &str,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<(), LedgerError> {
        self.orphans.lock().unwrap().push(QuarantinedConfirmation {
            reference: reference.to_string(),
            event_type: event_type.to_string(),
            payload,
        });
        Ok(())
    }

    async fn refund(&self, reference: &str) -> Result<bool, LedgerError> {
        let mut payments = self.payments.lock().unwrap();
        match payments.get_mut(reference) {
            Some(payment) if payment.status == PaymentStatus::Completed => {
                payment.status = PaymentStatus::Refunded;
                payment.updated_at = now_utc();
                drop(payments);

                let mut enrollments = self.enrollments.lock().unwrap();
                for enrollment in enrollments.values_mut() {
                    if enrollment.payment_reference.as_deref() == Some(reference) {
                        enrollment.payment_status = PaymentStatus::Refunded;
                    }
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

impl InMemoryLedger {
    fn upsert(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        payment_reference: Option<String>,
        payment_amount: Decimal,
        paid_at: Option<time::PrimitiveDateTime>,
    ) -> EnrollmentRecord {
        let mut enrollments = self.enrollments.lock().unwrap();
        let entry = enrollments
            .entry((user_id, course_id))
            .or_insert_with(|| EnrollmentRecord {
                id: Uuid::new_v4(),
                user_id,
                course_id,
                payment_reference: None,
                payment_status: PaymentStatus::Completed,
                payment_amount: Decimal::ZERO,
                paid_at: None,
                progress: 0,
                enrolled_at: now_utc(),
            });
        entry.payment_reference = payment_reference;
        entry.payment_status = PaymentStatus::Completed;
        entry.payment_amount = payment_amount;
        entry.paid_at = paid_at;
        entry.clone()
    }
}

pub const FAKE_GATEWAY_SECRET: &[u8] = b"sk_test_fake_gateway";

/// Programmable [`PaymentGateway`] double. Confirmations are keyed by
/// reference and returned by `verify_transaction`; webhook signatures use
/// the same HMAC scheme as the real client.
pub struct FakeGateway {
    confirmations: Mutex<HashMap<String, GatewayConfirmation>>,
    initialized: Mutex<Vec<InitializeTransaction>>,
    fail_initialize: AtomicBool,
    verify_delay: Mutex<Option<Duration>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self {
            confirmations: Mutex::new(HashMap::new()),
            initialized: Mutex::new(Vec::new()),
            fail_initialize: AtomicBool::new(false),
            verify_delay: Mutex::new(None),
        }
    }

    pub fn fail_next_initialize(&self) {
        self.fail_initialize.store(true, Ordering::SeqCst);
    }

    /// Make every `verify_transaction` call stall for `delay`.
    pub fn stall_verify(&self, delay: Duration) {
        *self.verify_delay.lock().unwrap() = Some(delay);
    }

    pub fn last_initialize(&self) -> Option<InitializeTransaction> {
        self.initialized.lock().unwrap().last().cloned()
    }

    pub fn set_confirmation(&self, confirmation: GatewayConfirmation) {
        self.confirmations
            .lock()
            .unwrap()
            .insert(confirmation.reference.clone(), confirmation);
    }

    pub fn confirm(&self, reference: &str, status: GatewayTxStatus, amount_minor_units: i64) {
        self.set_confirmation(make_confirmation(reference, status, amount_minor_units));
    }

    pub fn sign(&self, raw_body: &[u8]) -> String {
        signature::sign(FAKE_GATEWAY_SECRET, raw_body)
    }
}

/// Build a confirmation the way the real client would parse one.
pub fn make_confirmation(
    reference: &str,
    status: GatewayTxStatus,
    amount_minor_units: i64,
) -> GatewayConfirmation {
    GatewayConfirmation {
        reference: reference.to_string(),
        status: status.clone(),
        amount_minor_units,
        currency: "NGN".to_string(),
        channel: Some("card".to_string()),
        paid_at: status
            .is_success()
            .then(time::OffsetDateTime::now_utc),
        metadata: serde_json::json!({}),
        raw: serde_json::json!({
            "reference": reference,
            "status": status.to_string(),
            "amount": amount_minor_units,
        }),
    }
}

/// Serialize a webhook delivery body for a confirmation.
pub fn webhook_body(event: &str, confirmation: &GatewayConfirmation) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "event": event,
        "data": {
            "reference": confirmation.reference,
            "status": confirmation.status.to_string(),
            "amount": confirmation.amount_minor_units,
            "currency": confirmation.currency,
            "channel": confirmation.channel,
            "metadata": confirmation.metadata,
        }
    }))
    .unwrap()
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn initialize_transaction(
        &self,
        request: InitializeTransaction,
    ) -> Result<GatewayAuthorization, GatewayError> {
        if self.fail_initialize.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::Api {
                message: "simulated initialize failure".to_string(),
            });
        }
        let authorization = GatewayAuthorization {
            authorization_url: format!("https://checkout.test/{}", request.reference),
            access_code: "acc_test".to_string(),
            reference: request.reference.clone(),
        };
        self.initialized.lock().unwrap().push(request);
        Ok(authorization)
    }

    async fn verify_transaction(
        &self,
        reference: &str,
    ) -> Result<GatewayConfirmation, GatewayError> {
        let delay = *self.verify_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.confirmations
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound {
                reference: reference.to_string(),
            })
    }

    fn verify_webhook_signature(&self, raw_body: &[u8], signature_header: Option<&str>) -> bool {
        signature::verify(FAKE_GATEWAY_SECRET, raw_body, signature_header).is_ok()
    }

    fn parse_webhook_event(&self, raw_body: &[u8]) -> Result<WebhookEvent, GatewayError> {
        crate::gateway::paystack::parse_webhook_event(raw_body)
    }
}
