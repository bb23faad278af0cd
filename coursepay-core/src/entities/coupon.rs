use kanau::processor::Processor;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::DiscountType;
use crate::framework::DatabaseProcessor;

/// A discount code as stored. Validation against a concrete course and
/// price happens in [`crate::pricing`].
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CouponRecord {
    pub id: Uuid,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub minimum_amount: Decimal,
    /// `None` means the coupon applies to any course.
    pub course_id: Option<Uuid>,
    pub is_active: bool,
    pub starts_at: Option<time::PrimitiveDateTime>,
    pub expires_at: Option<time::PrimitiveDateTime>,
}

/// Look up a coupon by code, case-insensitively.
#[derive(Debug, Clone)]
pub struct GetCouponByCode {
    pub code: String,
}

impl Processor<GetCouponByCode> for DatabaseProcessor {
    type Output = Option<CouponRecord>;
    type Error = sqlx::Error;
    #[tracing::instrument(skip_all, err, name = "SQL:GetCouponByCode")]
    async fn process(&self, msg: GetCouponByCode) -> Result<Option<CouponRecord>, sqlx::Error> {
        sqlx::query_as::<_, CouponRecord>(
            r#"
            SELECT id, code, discount_type, discount_value, minimum_amount,
                   course_id, is_active, starts_at, expires_at
            FROM coupons
            WHERE upper(code) = upper($1)
            "#,
        )
        .bind(&msg.code)
        .fetch_optional(&self.pool)
        .await
    }
}
