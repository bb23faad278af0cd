use kanau::processor::Processor;

use crate::framework::DatabaseProcessor;

/// A gateway confirmation whose reference matched no ledger entry.
///
/// Successful charges must never be dropped silently, but with no ledger
/// row there is nowhere to record the payload, so it is quarantined here
/// and surfaced through the admin API for manual review.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct OrphanedConfirmation {
    pub id: uuid::Uuid,
    pub reference: String,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub received_at: time::PrimitiveDateTime,
    pub resolved: bool,
}

/// Quarantine one unmatched confirmation.
#[derive(Debug, Clone)]
pub struct RecordOrphanedConfirmation {
    pub reference: String,
    pub event_type: String,
    pub payload: serde_json::Value,
}

impl Processor<RecordOrphanedConfirmation> for DatabaseProcessor {
    type Output = OrphanedConfirmation;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:RecordOrphanedConfirmation")]
    async fn process(
        &self,
        msg: RecordOrphanedConfirmation,
    ) -> Result<OrphanedConfirmation, sqlx::Error> {
        sqlx::query_as::<_, OrphanedConfirmation>(
            r#"
            INSERT INTO orphaned_confirmations (reference, event_type, payload)
            VALUES ($1, $2, $3)
            RETURNING id, reference, event_type, payload, received_at, resolved
            "#,
        )
        .bind(&msg.reference)
        .bind(&msg.event_type)
        .bind(&msg.payload)
        .fetch_one(&self.pool)
        .await
    }
}

/// Unresolved quarantined confirmations, newest first.
#[derive(Debug, Clone)]
pub struct ListUnresolvedOrphans {
    pub limit: i64,
}

impl Processor<ListUnresolvedOrphans> for DatabaseProcessor {
    type Output = Vec<OrphanedConfirmation>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:ListUnresolvedOrphans")]
    async fn process(
        &self,
        msg: ListUnresolvedOrphans,
    ) -> Result<Vec<OrphanedConfirmation>, sqlx::Error> {
        sqlx::query_as::<_, OrphanedConfirmation>(
            r#"
            SELECT id, reference, event_type, payload, received_at, resolved
            FROM orphaned_confirmations
            WHERE resolved = false
            ORDER BY received_at DESC
            LIMIT $1
            "#,
        )
        .bind(msg.limit)
        .fetch_all(&self.pool)
        .await
    }
}
