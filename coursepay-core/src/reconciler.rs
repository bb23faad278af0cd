//! Enrollment reconciliation: converting gateway confirmations into
//! durable local state.
//!
//! The same confirmation can arrive through two unordered channels, the
//! asynchronous webhook and the buyer's post-redirect verify call, and
//! either may repeat. Correctness does not depend on arrival order or
//! count: the ledger transition is mark-if-not-terminal and the
//! enrollment write is an upsert on `(user_id, course_id)`, so every
//! replay converges to the same end state.

use std::time::Duration;

use crate::entities::course::CourseDetail;
use crate::entities::enrollment::EnrollmentRecord;
use crate::gateway::{GatewayConfirmation, GatewayError, PaymentGateway, from_minor_units};
use crate::ledger::{CompletePayment, LedgerError, LedgerStore};

/// Confirmation source, for logging and quarantine records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Webhook,
    ClientVerify,
    AdminReconcile,
}

impl Channel {
    fn label(self) -> &'static str {
        match self {
            Channel::Webhook => "webhook",
            Channel::ClientVerify => "client.verify",
            Channel::AdminReconcile => "admin.reconcile",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Store(#[from] LedgerError),
    /// The payment completed but its course is no longer visible, so no
    /// summary can be produced. The enrollment itself was written.
    #[error("course {course_id} not found for completed payment")]
    CourseMissing { course_id: uuid::Uuid },
}

/// A settled successful payment with everything the buyer-facing verify
/// response needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedEnrollment {
    pub enrollment: EnrollmentRecord,
    pub course: CourseDetail,
    /// Amount the gateway actually charged, in major units.
    pub amount: rust_decimal::Decimal,
}

/// What one reconciliation pass concluded.
#[derive(Debug)]
pub enum ReconcileOutcome {
    /// Payment completed and enrollment upserted (or re-confirmed).
    Completed(Box<CompletedEnrollment>),
    /// Settled failure; ledger entry marked failed (no-op on replay).
    Failed { reference: String },
    /// Gateway has not settled the charge; nothing was written.
    Pending { reference: String },
    /// Successful confirmation that could not be applied; quarantined
    /// for manual review.
    Quarantined { reference: String },
    /// Settled failure for a reference this system never issued; nothing
    /// to record.
    Ignored { reference: String },
}

/// Apply one gateway confirmation. Identical logic for every channel.
pub async fn apply_confirmation<S: LedgerStore + ?Sized>(
    store: &S,
    confirmation: &GatewayConfirmation,
    channel: Channel,
) -> Result<ReconcileOutcome, ReconcileError> {
    let reference = confirmation.reference.as_str();

    // An unsettled status must never fail the payment: the charge may
    // still resolve, and the webhook channel will say so.
    if !confirmation.status.is_settled() {
        tracing::info!(
            reference = %reference,
            status = %confirmation.status,
            channel = channel.label(),
            "charge not settled yet"
        );
        return Ok(ReconcileOutcome::Pending {
            reference: reference.to_string(),
        });
    }

    let payment = store.payment_by_reference(reference).await?;
    let Some(payment) = payment else {
        if confirmation.status.is_success() {
            // A successful charge must never be dropped silently; with no
            // ledger row there is nowhere to apply it, so quarantine.
            tracing::error!(
                reference = %reference,
                channel = channel.label(),
                "successful confirmation matches no ledger entry, quarantining"
            );
            store
                .quarantine_confirmation(reference, channel.label(), confirmation.raw.clone())
                .await?;
            return Ok(ReconcileOutcome::Quarantined {
                reference: reference.to_string(),
            });
        }
        tracing::warn!(
            reference = %reference,
            status = %confirmation.status,
            channel = channel.label(),
            "failed confirmation for unknown reference, ignoring"
        );
        return Ok(ReconcileOutcome::Ignored {
            reference: reference.to_string(),
        });
    };

    if !confirmation.status.is_success() {
        let transitioned = store.mark_failed(reference).await?;
        tracing::info!(
            reference = %reference,
            status = %confirmation.status,
            channel = channel.label(),
            transitioned,
            "charge settled unsuccessfully"
        );
        return Ok(ReconcileOutcome::Failed {
            reference: reference.to_string(),
        });
    }

    // The ledger is authoritative for which course a reference belongs
    // to; gateway metadata is advisory and only checked for drift.
    if let Some(metadata_course) = confirmation.metadata.get("course_id").and_then(|v| v.as_str())
        && metadata_course != payment.course_id.to_string()
    {
        tracing::warn!(
            reference = %reference,
            ledger_course = %payment.course_id,
            metadata_course,
            "gateway metadata names a different course, trusting ledger"
        );
    }

    let amount = from_minor_units(confirmation.amount_minor_units);
    if amount != payment.amount {
        tracing::warn!(
            reference = %reference,
            expected = %payment.amount,
            charged = %amount,
            "gateway amount differs from pending amount, recording gateway amount"
        );
    }

    let completion = CompletePayment {
        reference: reference.to_string(),
        user_id: payment.user_id,
        course_id: payment.course_id,
        amount,
        paid_at: Some(paid_at_utc(confirmation)),
        payment_method: confirmation.channel.clone(),
        gateway_payload: confirmation.raw.clone(),
    };

    let Some(enrollment) = store.complete_and_enroll(completion).await? else {
        // Success after a locally terminal non-completed state: the money
        // moved but the ledger disagrees. Keep the payload for review.
        tracing::error!(
            reference = %reference,
            channel = channel.label(),
            "successful confirmation for a payment in a terminal non-completed state, quarantining"
        );
        store
            .quarantine_confirmation(reference, channel.label(), confirmation.raw.clone())
            .await?;
        return Ok(ReconcileOutcome::Quarantined {
            reference: reference.to_string(),
        });
    };

    tracing::info!(
        reference = %reference,
        user_id = %enrollment.user_id,
        course_id = %enrollment.course_id,
        amount = %amount,
        channel = channel.label(),
        "payment completed and enrollment upserted"
    );

    let course = store
        .course_detail(payment.course_id)
        .await?
        .ok_or(ReconcileError::CourseMissing {
            course_id: payment.course_id,
        })?;

    Ok(ReconcileOutcome::Completed(Box::new(CompletedEnrollment {
        enrollment,
        course,
        amount,
    })))
}

/// Client-path reconciliation: re-derive truth from the gateway instead
/// of trusting anything the browser sent, then apply it.
///
/// The outbound verify call is bounded by `verify_timeout`; a slow
/// gateway reports as pending, never as a failed payment.
pub async fn verify_and_reconcile<S: LedgerStore + ?Sized>(
    store: &S,
    gateway: &dyn PaymentGateway,
    reference: &str,
    verify_timeout: Duration,
    channel: Channel,
) -> Result<ReconcileOutcome, ReconcileError> {
    let verified = tokio::time::timeout(verify_timeout, gateway.verify_transaction(reference)).await;
    match verified {
        Err(_elapsed) => {
            tracing::warn!(reference = %reference, "gateway verify timed out, reporting pending");
            Ok(ReconcileOutcome::Pending {
                reference: reference.to_string(),
            })
        }
        Ok(Err(error)) => Err(error.into()),
        Ok(Ok(confirmation)) => apply_confirmation(store, &confirmation, channel).await,
    }
}

/// Outcome of one webhook delivery, acknowledged to the gateway.
#[derive(Debug)]
pub struct WebhookAck {
    pub event_type: String,
    /// `None` for event types this system does not act on.
    pub outcome: Option<ReconcileOutcome>,
}

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// Authentication failure: missing or mismatched signature. Rejected
    /// before any parsing or processing.
    #[error("webhook signature verification failed")]
    Signature,
    #[error("malformed webhook body: {0}")]
    Malformed(String),
    /// Processing failed after authentication; the gateway should retry.
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

/// Authenticate and process one webhook delivery.
pub async fn process_webhook<S: LedgerStore + ?Sized>(
    store: &S,
    gateway: &dyn PaymentGateway,
    raw_body: &[u8],
    signature_header: Option<&str>,
) -> Result<WebhookAck, WebhookError> {
    // Fail closed: nothing is parsed, let alone processed, until the
    // body authenticates against the shared secret.
    if !gateway.verify_webhook_signature(raw_body, signature_header) {
        tracing::warn!(
            header_present = signature_header.is_some(),
            "rejected webhook with invalid signature"
        );
        return Err(WebhookError::Signature);
    }

    let event = gateway.parse_webhook_event(raw_body).map_err(|error| {
        tracing::warn!(error = %error, "rejected unparseable webhook body");
        WebhookError::Malformed(error.to_string())
    })?;

    let Some(confirmation) = &event.confirmation else {
        tracing::debug!(event_type = %event.event_type, "acknowledged webhook event without action");
        return Ok(WebhookAck {
            event_type: event.event_type,
            outcome: None,
        });
    };

    let outcome = apply_confirmation(store, confirmation, Channel::Webhook).await?;
    Ok(WebhookAck {
        event_type: event.event_type,
        outcome: Some(outcome),
    })
}

fn paid_at_utc(confirmation: &GatewayConfirmation) -> time::PrimitiveDateTime {
    let at = confirmation
        .paid_at
        .unwrap_or_else(time::OffsetDateTime::now_utc)
        .to_offset(time::UtcOffset::UTC);
    time::PrimitiveDateTime::new(at.date(), at.time())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::{self, CheckoutPolicy, CheckoutRequest, InitializeOutcome};
    use crate::config::CheckoutConfig;
    use crate::entities::PaymentStatus;
    use crate::gateway::GatewayTxStatus;
    use crate::testing::{FakeGateway, InMemoryLedger, make_confirmation, webhook_body};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    const VERIFY_TIMEOUT: Duration = Duration::from_secs(5);

    struct Scenario {
        store: InMemoryLedger,
        gateway: FakeGateway,
        user_id: Uuid,
        course_id: Uuid,
        reference: String,
    }

    /// Drive a real checkout so the ledger has a pending entry, exactly
    /// like production before a confirmation arrives.
    async fn pending_checkout(price: i64) -> Scenario {
        let store = InMemoryLedger::new();
        let gateway = FakeGateway::new();
        let user_id = Uuid::new_v4();
        let course_id = store.add_course("Intro to Rust", Decimal::new(price, 0));

        let policy = CheckoutPolicy {
            currency: "NGN".to_string(),
            default_callback_url: "https://learn.example.com/cb".to_string(),
            redirect: CheckoutConfig::default(),
        };
        let outcome = checkout::initialize(
            &store,
            &gateway,
            &policy,
            CheckoutRequest {
                user_id,
                email: "learner@example.com".to_string(),
                course_id,
                coupon_code: None,
                redirect_url: None,
            },
        )
        .await
        .unwrap();
        let InitializeOutcome::Redirect(session) = outcome else {
            panic!("expected redirect");
        };

        Scenario {
            store,
            gateway,
            user_id,
            course_id,
            reference: session.payment.reference,
        }
    }

    fn payment_status(scenario: &Scenario) -> PaymentStatus {
        scenario
            .store
            .all_payments()
            .into_iter()
            .find(|p| p.reference == scenario.reference)
            .unwrap()
            .status
    }

    #[tokio::test]
    async fn successful_confirmation_completes_and_enrolls() {
        let s = pending_checkout(5000).await;
        let confirmation = make_confirmation(&s.reference, GatewayTxStatus::Success, 500_000);

        let outcome = apply_confirmation(&s.store, &confirmation, Channel::Webhook)
            .await
            .unwrap();

        let ReconcileOutcome::Completed(completed) = outcome else {
            panic!("expected completed");
        };
        assert_eq!(completed.amount, Decimal::new(5000, 0));
        assert_eq!(completed.course.id, s.course_id);
        assert_eq!(completed.enrollment.user_id, s.user_id);
        assert_eq!(
            completed.enrollment.payment_reference.as_deref(),
            Some(s.reference.as_str())
        );
        assert_eq!(payment_status(&s), PaymentStatus::Completed);
        assert_eq!(s.store.enrollment_count(), 1);
    }

    #[tokio::test]
    async fn reapplying_the_same_confirmation_is_idempotent() {
        let s = pending_checkout(5000).await;
        let confirmation = make_confirmation(&s.reference, GatewayTxStatus::Success, 500_000);

        let first = apply_confirmation(&s.store, &confirmation, Channel::Webhook)
            .await
            .unwrap();
        let second = apply_confirmation(&s.store, &confirmation, Channel::Webhook)
            .await
            .unwrap();

        assert!(matches!(first, ReconcileOutcome::Completed(_)));
        assert!(matches!(second, ReconcileOutcome::Completed(_)));
        assert_eq!(s.store.enrollment_count(), 1);
        assert_eq!(payment_status(&s), PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn both_channel_orders_converge_to_the_same_state() {
        for webhook_first in [true, false] {
            let s = pending_checkout(4000).await;
            s.gateway
                .confirm(&s.reference, GatewayTxStatus::Success, 400_000);
            let confirmation = make_confirmation(&s.reference, GatewayTxStatus::Success, 400_000);

            if webhook_first {
                apply_confirmation(&s.store, &confirmation, Channel::Webhook)
                    .await
                    .unwrap();
                verify_and_reconcile(
                    &s.store,
                    &s.gateway,
                    &s.reference,
                    VERIFY_TIMEOUT,
                    Channel::ClientVerify,
                )
                .await
                .unwrap();
            } else {
                verify_and_reconcile(
                    &s.store,
                    &s.gateway,
                    &s.reference,
                    VERIFY_TIMEOUT,
                    Channel::ClientVerify,
                )
                .await
                .unwrap();
                apply_confirmation(&s.store, &confirmation, Channel::Webhook)
                    .await
                    .unwrap();
            }

            assert_eq!(
                payment_status(&s),
                PaymentStatus::Completed,
                "webhook_first = {webhook_first}"
            );
            assert_eq!(s.store.enrollment_count(), 1);
            let enrollment = s
                .store
                .enrollment_for(s.user_id, s.course_id)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(enrollment.payment_amount, Decimal::new(4000, 0));
        }
    }

    #[tokio::test]
    async fn settled_failure_marks_failed_without_enrollment() {
        let s = pending_checkout(5000).await;
        let confirmation = make_confirmation(&s.reference, GatewayTxStatus::Failed, 500_000);

        let outcome = apply_confirmation(&s.store, &confirmation, Channel::Webhook)
            .await
            .unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Failed { .. }));
        assert_eq!(payment_status(&s), PaymentStatus::Failed);
        assert_eq!(s.store.enrollment_count(), 0);

        // Re-delivery of the same failed event is a no-op.
        let again = apply_confirmation(&s.store, &confirmation, Channel::Webhook)
            .await
            .unwrap();
        assert!(matches!(again, ReconcileOutcome::Failed { .. }));
        assert_eq!(payment_status(&s), PaymentStatus::Failed);
    }

    #[tokio::test]
    async fn unsettled_status_changes_nothing() {
        let s = pending_checkout(5000).await;
        let confirmation = make_confirmation(&s.reference, GatewayTxStatus::Pending, 500_000);

        let outcome = apply_confirmation(&s.store, &confirmation, Channel::ClientVerify)
            .await
            .unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Pending { .. }));
        assert_eq!(payment_status(&s), PaymentStatus::Pending);
        assert_eq!(s.store.enrollment_count(), 0);
    }

    #[tokio::test]
    async fn success_after_local_failure_is_quarantined() {
        let s = pending_checkout(5000).await;
        s.store.mark_failed(&s.reference).await.unwrap();

        let confirmation = make_confirmation(&s.reference, GatewayTxStatus::Success, 500_000);
        let outcome = apply_confirmation(&s.store, &confirmation, Channel::Webhook)
            .await
            .unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Quarantined { .. }));
        assert_eq!(payment_status(&s), PaymentStatus::Failed);
        assert_eq!(s.store.enrollment_count(), 0);
        assert_eq!(s.store.orphans().len(), 1);
    }

    #[tokio::test]
    async fn unknown_successful_reference_is_quarantined() {
        let store = InMemoryLedger::new();
        let confirmation = make_confirmation("TXN-1-NOSUCH", GatewayTxStatus::Success, 100_000);

        let outcome = apply_confirmation(&store, &confirmation, Channel::Webhook)
            .await
            .unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Quarantined { .. }));
        let orphans = store.orphans();
        assert_eq!(orphans.len(), 1);
        assert_eq!(orphans[0].reference, "TXN-1-NOSUCH");
    }

    #[tokio::test]
    async fn unknown_failed_reference_is_ignored() {
        let store = InMemoryLedger::new();
        let confirmation = make_confirmation("TXN-1-NOSUCH", GatewayTxStatus::Abandoned, 100_000);

        let outcome = apply_confirmation(&store, &confirmation, Channel::Webhook)
            .await
            .unwrap();
        assert!(matches!(outcome, ReconcileOutcome::Ignored { .. }));
        assert!(store.orphans().is_empty());
    }

    #[tokio::test]
    async fn gateway_amount_wins_on_mismatch() {
        let s = pending_checkout(5000).await;
        // Gateway charged 4000 (say a gateway-side promotion), not 5000.
        let confirmation = make_confirmation(&s.reference, GatewayTxStatus::Success, 400_000);

        let outcome = apply_confirmation(&s.store, &confirmation, Channel::Webhook)
            .await
            .unwrap();
        let ReconcileOutcome::Completed(completed) = outcome else {
            panic!("expected completed");
        };
        assert_eq!(completed.enrollment.payment_amount, Decimal::new(4000, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn verify_timeout_reports_pending_and_writes_nothing() {
        let s = pending_checkout(5000).await;
        s.gateway
            .confirm(&s.reference, GatewayTxStatus::Success, 500_000);
        s.gateway.stall_verify(Duration::from_secs(60));

        let outcome = verify_and_reconcile(
            &s.store,
            &s.gateway,
            &s.reference,
            Duration::from_secs(10),
            Channel::ClientVerify,
        )
        .await
        .unwrap();

        assert!(matches!(outcome, ReconcileOutcome::Pending { .. }));
        assert_eq!(payment_status(&s), PaymentStatus::Pending);
        assert_eq!(s.store.enrollment_count(), 0);
    }

    #[tokio::test]
    async fn webhook_with_bad_signature_mutates_nothing() {
        let s = pending_checkout(5000).await;
        let confirmation = make_confirmation(&s.reference, GatewayTxStatus::Success, 500_000);
        let body = webhook_body("charge.success", &confirmation);

        let missing = process_webhook(&s.store, &s.gateway, &body, None).await;
        assert!(matches!(missing, Err(WebhookError::Signature)));

        let mut tampered = body.clone();
        let valid_header = s.gateway.sign(&body);
        tampered.extend_from_slice(b" ");
        let mismatch =
            process_webhook(&s.store, &s.gateway, &tampered, Some(&valid_header)).await;
        assert!(matches!(mismatch, Err(WebhookError::Signature)));

        assert_eq!(payment_status(&s), PaymentStatus::Pending);
        assert_eq!(s.store.enrollment_count(), 0);
        assert!(s.store.orphans().is_empty());
    }

    #[tokio::test]
    async fn signed_webhook_completes_the_payment() {
        let s = pending_checkout(5000).await;
        let confirmation = make_confirmation(&s.reference, GatewayTxStatus::Success, 500_000);
        let body = webhook_body("charge.success", &confirmation);
        let header = s.gateway.sign(&body);

        let ack = process_webhook(&s.store, &s.gateway, &body, Some(&header))
            .await
            .unwrap();

        assert_eq!(ack.event_type, "charge.success");
        assert!(matches!(ack.outcome, Some(ReconcileOutcome::Completed(_))));
        assert_eq!(payment_status(&s), PaymentStatus::Completed);
    }

    #[tokio::test]
    async fn non_charge_events_are_acknowledged_without_action() {
        let store = InMemoryLedger::new();
        let gateway = FakeGateway::new();
        let body = br#"{"event":"subscription.create","data":{"id":1}}"#;
        let header = gateway.sign(body);

        let ack = process_webhook(&store, &gateway, body, Some(&header))
            .await
            .unwrap();
        assert_eq!(ack.event_type, "subscription.create");
        assert!(ack.outcome.is_none());
    }
}
