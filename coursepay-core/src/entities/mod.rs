pub mod coupon;
pub mod course;
pub mod enrollment;
pub mod orphaned_confirmation;
pub mod payment;
pub mod session;

use coursepay_sdk::objects::{DiscountType as SdkDiscountType, PaymentStatus as SdkPaymentStatus};

/// Payment status for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see
/// `coursepay_sdk::objects::PaymentStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "payment_status")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
    Refunded,
}

impl PaymentStatus {
    /// Terminal statuses accept no further automatic transition; only the
    /// admin refund path moves `Completed` to `Refunded`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, PaymentStatus::Pending)
    }
}

impl From<PaymentStatus> for SdkPaymentStatus {
    fn from(value: PaymentStatus) -> Self {
        match value {
            PaymentStatus::Pending => SdkPaymentStatus::Pending,
            PaymentStatus::Completed => SdkPaymentStatus::Completed,
            PaymentStatus::Failed => SdkPaymentStatus::Failed,
            PaymentStatus::Refunded => SdkPaymentStatus::Refunded,
        }
    }
}

impl From<SdkPaymentStatus> for PaymentStatus {
    fn from(value: SdkPaymentStatus) -> Self {
        match value {
            SdkPaymentStatus::Pending => PaymentStatus::Pending,
            SdkPaymentStatus::Completed => PaymentStatus::Completed,
            SdkPaymentStatus::Failed => PaymentStatus::Failed,
            SdkPaymentStatus::Refunded => PaymentStatus::Refunded,
        }
    }
}

/// Coupon discount type for database operations.
///
/// This is the sqlx::Type version. For API/DTO use, see
/// `coursepay_sdk::objects::DiscountType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "discount_type")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

impl From<DiscountType> for SdkDiscountType {
    fn from(value: DiscountType) -> Self {
        match value {
            DiscountType::Percentage => SdkDiscountType::Percentage,
            DiscountType::Fixed => SdkDiscountType::Fixed,
        }
    }
}

impl From<SdkDiscountType> for DiscountType {
    fn from(value: SdkDiscountType) -> Self {
        match value {
            SdkDiscountType::Percentage => DiscountType::Percentage,
            SdkDiscountType::Fixed => DiscountType::Fixed,
        }
    }
}

/// Course lifecycle status; only `Published` courses are purchasable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(rename_all = "lowercase", type_name = "course_status")]
pub enum CourseStatus {
    Draft,
    Published,
    Archived,
}

/// Current wall-clock time as a UTC `PrimitiveDateTime`, matching the
/// timestamp columns.
pub fn now_utc() -> time::PrimitiveDateTime {
    let now = time::OffsetDateTime::now_utc();
    time::PrimitiveDateTime::new(now.date(), now.time())
}
