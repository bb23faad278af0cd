use kanau::processor::Processor;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::PaymentStatus;
use crate::framework::{DatabaseAccessor, DatabaseProcessor};

/// One ledger entry: the system of record for a single payment attempt.
///
/// Created in `pending` state before the buyer is ever redirected to the
/// gateway, so an entry exists even if the buyer never returns and even if
/// the webhook arrives before any client call. `reference` is the sole
/// correlation key with the gateway's record of the same charge.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub metadata: serde_json::Value,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub created_at: time::PrimitiveDateTime,
    pub updated_at: time::PrimitiveDateTime,
}

/// Insert a new ledger entry in `pending` state.
#[derive(Debug, Clone)]
pub struct CreatePendingPayment {
    pub reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub metadata: serde_json::Value,
}

impl Processor<CreatePendingPayment> for DatabaseProcessor {
    type Output = PaymentRecord;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:CreatePendingPayment")]
    async fn process(&self, msg: CreatePendingPayment) -> Result<PaymentRecord, sqlx::Error> {
        sqlx::query_as::<_, PaymentRecord>(
            r#"
            INSERT INTO payments (reference, amount, currency, status, metadata, user_id, course_id)
            VALUES ($1, $2, $3, 'pending', $4, $5, $6)
            RETURNING id, reference, amount, currency, status, payment_method, metadata,
                      user_id, course_id, created_at, updated_at
            "#,
        )
        .bind(&msg.reference)
        .bind(msg.amount)
        .bind(&msg.currency)
        .bind(&msg.metadata)
        .bind(msg.user_id)
        .bind(msg.course_id)
        .fetch_one(&self.pool)
        .await
    }
}

/// Look up a ledger entry by its gateway reference.
#[derive(Debug, Clone)]
pub struct GetPaymentByReference {
    pub reference: String,
}

impl Processor<GetPaymentByReference> for DatabaseProcessor {
    type Output = Option<PaymentRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetPaymentByReference")]
    async fn process(&self, msg: GetPaymentByReference) -> Result<Option<PaymentRecord>, sqlx::Error> {
        let mut db = DatabaseProcessor {
            pool: self.pool.clone(),
        };
        PaymentRecord::find_by_reference(&mut db, &msg.reference).await
    }
}

/// Admin listing with optional filters.
///
/// Filtering on `pending` yields the reconciliation-needed view: entries
/// that never received a successful gateway confirmation.
#[derive(Debug, Clone)]
pub struct ListPayments {
    pub status: Option<PaymentStatus>,
    pub user_id: Option<Uuid>,
    pub course_id: Option<Uuid>,
    pub limit: i64,
    pub offset: i64,
}

impl Processor<ListPayments> for DatabaseProcessor {
    type Output = Vec<PaymentRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListPayments")]
    async fn process(&self, msg: ListPayments) -> Result<Vec<PaymentRecord>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRecord>(
            r#"
            SELECT id, reference, amount, currency, status, payment_method, metadata,
                   user_id, course_id, created_at, updated_at
            FROM payments
            WHERE ($1::payment_status IS NULL OR status = $1)
              AND ($2::uuid IS NULL OR user_id = $2)
              AND ($3::uuid IS NULL OR course_id = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(msg.status)
        .bind(msg.user_id)
        .bind(msg.course_id)
        .bind(msg.limit)
        .bind(msg.offset)
        .fetch_all(&self.pool)
        .await
    }
}

/// One row of a learner's purchase history.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PurchaseRow {
    pub reference: String,
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
    pub course_id: Uuid,
    pub course_title: String,
    pub thumbnail: Option<String>,
    pub created_at: time::PrimitiveDateTime,
}

/// A learner's settled purchases joined with course summaries, newest first.
#[derive(Debug, Clone)]
pub struct ListPurchasesForUser {
    pub user_id: Uuid,
}

impl Processor<ListPurchasesForUser> for DatabaseProcessor {
    type Output = Vec<PurchaseRow>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListPurchasesForUser")]
    async fn process(&self, msg: ListPurchasesForUser) -> Result<Vec<PurchaseRow>, sqlx::Error> {
        sqlx::query_as::<_, PurchaseRow>(
            r#"
            SELECT p.reference, p.amount, p.currency, p.status, p.course_id,
                   c.title AS course_title, c.thumbnail, p.created_at
            FROM payments p
            JOIN courses c ON c.id = p.course_id
            WHERE p.user_id = $1 AND p.status IN ('completed', 'refunded')
            ORDER BY p.created_at DESC
            "#,
        )
        .bind(msg.user_id)
        .fetch_all(&self.pool)
        .await
    }
}

impl PaymentRecord {
    pub async fn find_by_reference(
        db: &mut impl DatabaseAccessor,
        reference: &str,
    ) -> Result<Option<PaymentRecord>, sqlx::Error> {
        sqlx::query_as::<_, PaymentRecord>(
            r#"
            SELECT id, reference, amount, currency, status, payment_method, metadata,
                   user_id, course_id, created_at, updated_at
            FROM payments
            WHERE reference = $1
            "#,
        )
        .bind(reference)
        .fetch_optional(db.acquire())
        .await
    }

    /// Transition `pending → completed`, overwriting `metadata` with the
    /// gateway payload verbatim for audit. No-op (returns `false`) when
    /// the entry is already terminal.
    pub async fn mark_completed(
        db: &mut impl DatabaseAccessor,
        reference: &str,
        payment_method: Option<&str>,
        gateway_payload: &serde_json::Value,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'completed', payment_method = $2, metadata = $3,
                updated_at = (now() AT TIME ZONE 'utc')
            WHERE reference = $1 AND status = 'pending'
            "#,
        )
        .bind(reference)
        .bind(payment_method)
        .bind(gateway_payload)
        .execute(db.acquire())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Transition `pending → failed`. No-op (returns `false`) when the
    /// entry is already terminal.
    pub async fn mark_failed(
        db: &mut impl DatabaseAccessor,
        reference: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'failed', updated_at = (now() AT TIME ZONE 'utc')
            WHERE reference = $1 AND status = 'pending'
            "#,
        )
        .bind(reference)
        .execute(db.acquire())
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Admin-only transition `completed → refunded`.
    pub async fn mark_refunded(
        db: &mut impl DatabaseAccessor,
        reference: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = 'refunded', updated_at = (now() AT TIME ZONE 'utc')
            WHERE reference = $1 AND status = 'completed'
            "#,
        )
        .bind(reference)
        .execute(db.acquire())
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
