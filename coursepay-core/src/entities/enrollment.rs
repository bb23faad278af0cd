use kanau::processor::Processor;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::PaymentStatus;
use crate::framework::{DatabaseAccessor, DatabaseProcessor};

/// Proof that a user has paid-for (or free) access to a course.
///
/// At most one row per `(user_id, course_id)`; every write is an upsert on
/// that key, never a blind insert. A row with `payment_status = completed`
/// is the sole authorization for course content access.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct EnrollmentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub payment_reference: Option<String>,
    pub payment_status: PaymentStatus,
    pub payment_amount: Decimal,
    pub paid_at: Option<time::PrimitiveDateTime>,
    pub progress: i32,
    pub enrolled_at: time::PrimitiveDateTime,
}

/// Look up one enrollment by its natural key.
#[derive(Debug, Clone)]
pub struct GetEnrollmentForUserCourse {
    pub user_id: Uuid,
    pub course_id: Uuid,
}

impl Processor<GetEnrollmentForUserCourse> for DatabaseProcessor {
    type Output = Option<EnrollmentRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetEnrollmentForUserCourse")]
    async fn process(
        &self,
        msg: GetEnrollmentForUserCourse,
    ) -> Result<Option<EnrollmentRecord>, sqlx::Error> {
        sqlx::query_as::<_, EnrollmentRecord>(
            r#"
            SELECT id, user_id, course_id, payment_reference, payment_status,
                   payment_amount, paid_at, progress, enrolled_at
            FROM enrollments
            WHERE user_id = $1 AND course_id = $2
            "#,
        )
        .bind(msg.user_id)
        .bind(msg.course_id)
        .fetch_optional(&self.pool)
        .await
    }
}

/// One row of a learner's enrollment list.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct EnrollmentWithCourse {
    pub id: Uuid,
    pub course_id: Uuid,
    pub course_title: String,
    pub thumbnail: Option<String>,
    pub payment_status: PaymentStatus,
    pub payment_amount: Decimal,
    pub progress: i32,
    pub enrolled_at: time::PrimitiveDateTime,
}

/// A learner's enrollments joined with course summaries, newest first.
#[derive(Debug, Clone)]
pub struct ListEnrollmentsForUser {
    pub user_id: Uuid,
}

impl Processor<ListEnrollmentsForUser> for DatabaseProcessor {
    type Output = Vec<EnrollmentWithCourse>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListEnrollmentsForUser")]
    async fn process(
        &self,
        msg: ListEnrollmentsForUser,
    ) -> Result<Vec<EnrollmentWithCourse>, sqlx::Error> {
        sqlx::query_as::<_, EnrollmentWithCourse>(
            r#"
            SELECT e.id, e.course_id, c.title AS course_title, c.thumbnail,
                   e.payment_status, e.payment_amount, e.progress, e.enrolled_at
            FROM enrollments e
            JOIN courses c ON c.id = e.course_id
            WHERE e.user_id = $1
            ORDER BY e.enrolled_at DESC
            "#,
        )
        .bind(msg.user_id)
        .fetch_all(&self.pool)
        .await
    }
}

impl EnrollmentRecord {
    /// Upsert keyed on `(user_id, course_id)`: re-applying the same
    /// confirmation produces the same end state rather than a duplicate
    /// row or an error. `payment_reference` is `None` on the free path.
    pub async fn upsert_completed(
        db: &mut impl DatabaseAccessor,
        user_id: Uuid,
        course_id: Uuid,
        payment_reference: Option<&str>,
        payment_amount: Decimal,
        paid_at: Option<time::PrimitiveDateTime>,
    ) -> Result<EnrollmentRecord, sqlx::Error> {
        sqlx::query_as::<_, EnrollmentRecord>(
            r#"
            INSERT INTO enrollments (user_id, course_id, payment_reference, payment_status,
                                     payment_amount, paid_at)
            VALUES ($1, $2, $3, 'completed', $4, $5)
            ON CONFLICT (user_id, course_id) DO UPDATE SET
                payment_reference = EXCLUDED.payment_reference,
                payment_status = 'completed',
                payment_amount = EXCLUDED.payment_amount,
                paid_at = EXCLUDED.paid_at
            RETURNING id, user_id, course_id, payment_reference, payment_status,
                      payment_amount, paid_at, progress, enrolled_at
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .bind(payment_reference)
        .bind(payment_amount)
        .bind(paid_at)
        .fetch_one(db.acquire())
        .await
    }

    /// Downgrade the enrollment tied to a refunded payment so it no longer
    /// grants content access.
    pub async fn downgrade_refunded(
        db: &mut impl DatabaseAccessor,
        payment_reference: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE enrollments
            SET payment_status = 'refunded'
            WHERE payment_reference = $1 AND payment_status = 'completed'
            "#,
        )
        .bind(payment_reference)
        .execute(db.acquire())
        .await?;
        Ok(result.rows_affected() == 1)
    }
}
