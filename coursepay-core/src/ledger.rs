//! Persistence seam for the checkout and reconciliation flows.
//!
//! [`LedgerStore`] is the injected capability those flows run against:
//! the production implementation delegates to the entity messages on
//! [`DatabaseProcessor`], tests substitute an in-memory store. Every
//! mutation here is either a mark-if-not-terminal update or an upsert on
//! a natural key, so re-applying the same confirmation converges instead
//! of erroring.

use async_trait::async_trait;
use kanau::processor::Processor;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::PaymentStatus;
use crate::entities::coupon::{CouponRecord, GetCouponByCode};
use crate::entities::course::{CourseDetail, GetCourseDetail};
use crate::entities::enrollment::{EnrollmentRecord, GetEnrollmentForUserCourse};
use crate::entities::orphaned_confirmation::RecordOrphanedConfirmation;
use crate::entities::payment::{CreatePendingPayment, GetPaymentByReference, PaymentRecord};
use crate::framework::DatabaseProcessor;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The generated reference already exists. Retryable: draw a new
    /// reference and create again.
    #[error("transaction reference already exists")]
    ReferenceCollision,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Everything needed to settle one successful confirmation: the ledger
/// transition and the enrollment upsert, applied in one atomic unit.
#[derive(Debug, Clone)]
pub struct CompletePayment {
    pub reference: String,
    pub user_id: Uuid,
    pub course_id: Uuid,
    /// Amount actually charged by the gateway, in major units. Source of
    /// truth for the enrollment record.
    pub amount: Decimal,
    pub paid_at: Option<time::PrimitiveDateTime>,
    pub payment_method: Option<String>,
    /// Gateway confirmation payload, stored verbatim for audit.
    pub gateway_payload: serde_json::Value,
}

/// Durable state the checkout and reconciliation flows read and write.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn course_detail(&self, course_id: Uuid) -> Result<Option<CourseDetail>, LedgerError>;

    async fn coupon_by_code(&self, code: &str) -> Result<Option<CouponRecord>, LedgerError>;

    async fn payment_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<PaymentRecord>, LedgerError>;

    async fn enrollment_for(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<EnrollmentRecord>, LedgerError>;

    /// Insert a new `pending` ledger entry. A duplicate reference maps to
    /// [`LedgerError::ReferenceCollision`], never a silent overwrite.
    async fn create_pending(
        &self,
        payment: CreatePendingPayment,
    ) -> Result<PaymentRecord, LedgerError>;

    /// `pending → failed`; no-op (`false`) when already terminal.
    async fn mark_failed(&self, reference: &str) -> Result<bool, LedgerError>;

    /// Atomically mark the payment completed and upsert the enrollment.
    ///
    /// Returns `None` without touching the enrollment when the ledger
    /// entry ended up in a terminal state other than `completed` (a
    /// success confirmation arriving after a local failure); the caller
    /// quarantines that confirmation instead.
    async fn complete_and_enroll(
        &self,
        completion: CompletePayment,
    ) -> Result<Option<EnrollmentRecord>, LedgerError>;

    /// Direct enrollment for a zero-price course: no ledger entry, no
    /// gateway involvement.
    async fn upsert_free_enrollment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<EnrollmentRecord, LedgerError>;

    /// Record a confirmation that could not be applied, for manual review.
    async fn quarantine_confirmation(
        &self,
        reference: &str,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<(), LedgerError>;

    /// Atomically `completed → refunded` plus enrollment downgrade.
    /// Returns `false` when the payment is not currently `completed`.
    async fn refund(&self, reference: &str) -> Result<bool, LedgerError>;
}

fn map_create_error(error: sqlx::Error) -> LedgerError {
    match &error {
        sqlx::Error::Database(db) if db.is_unique_violation() => LedgerError::ReferenceCollision,
        _ => LedgerError::Database(error),
    }
}

#[async_trait]
impl LedgerStore for DatabaseProcessor {
    async fn course_detail(&self, course_id: Uuid) -> Result<Option<CourseDetail>, LedgerError> {
        Ok(self.process(GetCourseDetail { course_id }).await?)
    }

    async fn coupon_by_code(&self, code: &str) -> Result<Option<CouponRecord>, LedgerError> {
        Ok(self
            .process(GetCouponByCode {
                code: code.to_string(),
            })
            .await?)
    }

    async fn payment_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<PaymentRecord>, LedgerError> {
        Ok(self
            .process(GetPaymentByReference {
                reference: reference.to_string(),
            })
            .await?)
    }

    async fn enrollment_for(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<EnrollmentRecord>, LedgerError> {
        Ok(self
            .process(GetEnrollmentForUserCourse { user_id, course_id })
            .await?)
    }

    async fn create_pending(
        &self,
        payment: CreatePendingPayment,
    ) -> Result<PaymentRecord, LedgerError> {
        self.process(payment).await.map_err(map_create_error)
    }

    async fn mark_failed(&self, reference: &str) -> Result<bool, LedgerError> {
        let mut db = DatabaseProcessor {
            pool: self.pool.clone(),
        };
        Ok(PaymentRecord::mark_failed(&mut db, reference).await?)
    }

    async fn complete_and_enroll(
        &self,
        completion: CompletePayment,
    ) -> Result<Option<EnrollmentRecord>, LedgerError> {
        let mut tx = self.begin().await?;

        PaymentRecord::mark_completed(
            &mut tx,
            &completion.reference,
            completion.payment_method.as_deref(),
            &completion.gateway_payload,
        )
        .await?;

        // Re-read inside the transaction: the mark is a no-op when the
        // entry is already terminal, and only a completed entry may carry
        // an enrollment.
        let payment = PaymentRecord::find_by_reference(&mut tx, &completion.reference).await?;
        let Some(payment) = payment else {
            return Ok(None);
        };
        if payment.status != PaymentStatus::Completed {
            return Ok(None);
        }

        let enrollment = EnrollmentRecord::upsert_completed(
            &mut tx,
            completion.user_id,
            completion.course_id,
            Some(&completion.reference),
            completion.amount,
            completion.paid_at,
        )
        .await?;

        tx.commit().await?;
        Ok(Some(enrollment))
    }

    async fn upsert_free_enrollment(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<EnrollmentRecord, LedgerError> {
        let mut db = DatabaseProcessor {
            pool: self.pool.clone(),
        };
        Ok(EnrollmentRecord::upsert_completed(
            &mut db,
            user_id,
            course_id,
            None,
            Decimal::ZERO,
            None,
        )
        .await?)
    }

    async fn quarantine_confirmation(
        &self,
        reference: &str,
        event_type: &str,
        payload: serde_json::Value,
    ) -> Result<(), LedgerError> {
        self.process(RecordOrphanedConfirmation {
            reference: reference.to_string(),
            event_type: event_type.to_string(),
            payload,
        })
        .await?;
        Ok(())
    }

    async fn refund(&self, reference: &str) -> Result<bool, LedgerError> {
        let mut tx = self.begin().await?;

        let refunded = PaymentRecord::mark_refunded(&mut tx, reference).await?;
        if !refunded {
            return Ok(false);
        }
        EnrollmentRecord::downgrade_refunded(&mut tx, reference).await?;

        tx.commit().await?;
        Ok(true)
    }
}
