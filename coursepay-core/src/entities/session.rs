use kanau::processor::Processor;
use uuid::Uuid;

use crate::framework::DatabaseProcessor;

/// The authenticated caller, resolved from a session token.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SessionUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
}

/// Resolve an unexpired session token to its user.
#[derive(Debug, Clone)]
pub struct GetSessionUser {
    pub token: String,
}

impl Processor<GetSessionUser> for DatabaseProcessor {
    type Output = Option<SessionUser>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetSessionUser")]
    async fn process(&self, msg: GetSessionUser) -> Result<Option<SessionUser>, sqlx::Error> {
        sqlx::query_as::<_, SessionUser>(
            r#"
            SELECT s.user_id, u.email, u.name
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.token = $1 AND s.expires_at > (now() AT TIME ZONE 'utc')
            "#,
        )
        .bind(&msg.token)
        .fetch_optional(&self.pool)
        .await
    }
}
