use kanau::processor::Processor;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::CourseStatus;
use crate::framework::DatabaseProcessor;

/// Course summary joined with its instructor's display name.
///
/// Only `published` courses are returned; drafts and archived courses are
/// invisible to the payment flow.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CourseDetail {
    pub id: Uuid,
    pub title: String,
    pub price: Decimal,
    pub thumbnail: Option<String>,
    pub instructor_name: String,
}

impl CourseDetail {
    pub fn is_free(&self) -> bool {
        self.price.is_zero()
    }
}

/// Look up a published course by id.
#[derive(Debug, Clone)]
pub struct GetCourseDetail {
    pub course_id: Uuid,
}

impl Processor<GetCourseDetail> for DatabaseProcessor {
    type Output = Option<CourseDetail>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetCourseDetail")]
    async fn process(&self, msg: GetCourseDetail) -> Result<Option<CourseDetail>, sqlx::Error> {
        sqlx::query_as::<_, CourseDetail>(
            r#"
            SELECT c.id, c.title, c.price, c.thumbnail, u.name AS instructor_name
            FROM courses c
            JOIN users u ON u.id = c.instructor_id
            WHERE c.id = $1 AND c.status = $2
            "#,
        )
        .bind(msg.course_id)
        .bind(CourseStatus::Published)
        .fetch_optional(&self.pool)
        .await
    }
}
