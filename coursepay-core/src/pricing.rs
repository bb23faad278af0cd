//! Cart pricing and coupon application.
//!
//! The engine bills at most one line: the first non-free item of the cart.
//! A rejected coupon never blocks checkout; the quote falls back to the
//! undiscounted price and carries the rejection reason for the caller.

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::DiscountType;
use crate::entities::coupon::CouponRecord;

/// One cart line as seen at checkout initiation.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub course_id: Uuid,
    pub unit_price: Decimal,
    pub is_free: bool,
}

/// Why a supplied coupon was not applied.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CouponError {
    #[error("coupon code not found")]
    NotFound,
    #[error("coupon is not active")]
    Inactive,
    #[error("coupon is not valid yet")]
    NotStarted,
    #[error("coupon has expired")]
    Expired,
    #[error("coupon does not apply to this course")]
    WrongCourse,
    #[error("course price is below the coupon minimum of {minimum}")]
    MinimumNotMet { minimum: Decimal },
}

/// The payable amount for one checkout attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct Quote {
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub payable: Decimal,
    /// Why the supplied coupon was rejected, when one was supplied and the
    /// quote fell back to the undiscounted price.
    pub coupon_error: Option<CouponError>,
}

impl Quote {
    pub fn undiscounted(subtotal: Decimal) -> Self {
        Self {
            subtotal,
            discount: Decimal::ZERO,
            payable: subtotal,
            coupon_error: None,
        }
    }

    pub fn with_coupon_error(mut self, error: CouponError) -> Self {
        self.coupon_error = Some(error);
        self
    }
}

/// The first non-free item is the one that gets billed; the rest of the
/// cart is UI-only.
pub fn first_billable(items: &[LineItem]) -> Option<&LineItem> {
    items
        .iter()
        .find(|item| !item.is_free && !item.unit_price.is_zero())
}

/// Validate a coupon against a concrete course and price, returning the
/// discount amount clamped to `[0, unit_price]`.
pub fn coupon_discount(
    coupon: &CouponRecord,
    course_id: Uuid,
    unit_price: Decimal,
    now: time::PrimitiveDateTime,
) -> Result<Decimal, CouponError> {
    if !coupon.is_active {
        return Err(CouponError::Inactive);
    }
    if let Some(starts_at) = coupon.starts_at
        && now < starts_at
    {
        return Err(CouponError::NotStarted);
    }
    if let Some(expires_at) = coupon.expires_at
        && now > expires_at
    {
        return Err(CouponError::Expired);
    }
    if let Some(scoped_course) = coupon.course_id
        && scoped_course != course_id
    {
        return Err(CouponError::WrongCourse);
    }
    if unit_price < coupon.minimum_amount {
        return Err(CouponError::MinimumNotMet {
            minimum: coupon.minimum_amount,
        });
    }

    let raw = match coupon.discount_type {
        DiscountType::Percentage => unit_price * coupon.discount_value / Decimal::ONE_HUNDRED,
        DiscountType::Fixed => coupon.discount_value,
    };
    Ok(raw.round_dp(2).clamp(Decimal::ZERO, unit_price))
}

/// Price one line item with an optional pre-fetched coupon.
///
/// A rejected coupon fails open: the quote keeps the base price and the
/// rejection reason travels in `coupon_error`.
pub fn quote(
    item: &LineItem,
    coupon: Option<&CouponRecord>,
    now: time::PrimitiveDateTime,
) -> Quote {
    let subtotal = if item.is_free {
        Decimal::ZERO
    } else {
        item.unit_price
    };
    let Some(coupon) = coupon else {
        return Quote::undiscounted(subtotal);
    };

    match coupon_discount(coupon, item.course_id, subtotal, now) {
        Ok(discount) => Quote {
            subtotal,
            discount,
            payable: subtotal - discount,
            coupon_error: None,
        },
        Err(error) => Quote::undiscounted(subtotal).with_coupon_error(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::now_utc;

    fn paid_item(price: i64) -> LineItem {
        LineItem {
            course_id: Uuid::new_v4(),
            unit_price: Decimal::new(price, 0),
            is_free: false,
        }
    }

    fn coupon(discount_type: DiscountType, value: i64, minimum: i64) -> CouponRecord {
        CouponRecord {
            id: Uuid::new_v4(),
            code: "SAVE20".to_string(),
            discount_type,
            discount_value: Decimal::new(value, 0),
            minimum_amount: Decimal::new(minimum, 0),
            course_id: None,
            is_active: true,
            starts_at: None,
            expires_at: None,
        }
    }

    #[test]
    fn twenty_percent_of_5000_pays_4000() {
        let item = paid_item(5000);
        let save20 = coupon(DiscountType::Percentage, 20, 1000);
        let quote = quote(&item, Some(&save20), now_utc());
        assert_eq!(quote.subtotal, Decimal::new(5000, 0));
        assert_eq!(quote.discount, Decimal::new(1000, 0));
        assert_eq!(quote.payable, Decimal::new(4000, 0));
        assert!(quote.coupon_error.is_none());
    }

    #[test]
    fn discount_never_exceeds_price() {
        let item = paid_item(5000);
        let big = coupon(DiscountType::Fixed, 10_000, 0);
        let quote = quote(&item, Some(&big), now_utc());
        assert_eq!(quote.discount, Decimal::new(5000, 0));
        assert_eq!(quote.payable, Decimal::ZERO);
    }

    #[test]
    fn minimum_not_met_fails_open_to_full_price() {
        let item = paid_item(500);
        let save20 = coupon(DiscountType::Percentage, 20, 1000);
        let quote = quote(&item, Some(&save20), now_utc());
        assert_eq!(quote.payable, Decimal::new(500, 0));
        assert_eq!(
            quote.coupon_error,
            Some(CouponError::MinimumNotMet {
                minimum: Decimal::new(1000, 0)
            })
        );
    }

    #[test]
    fn course_scoped_coupon_rejects_other_courses() {
        let item = paid_item(5000);
        let mut scoped = coupon(DiscountType::Fixed, 100, 0);
        scoped.course_id = Some(Uuid::new_v4());
        let err = coupon_discount(&scoped, item.course_id, item.unit_price, now_utc());
        assert_eq!(err, Err(CouponError::WrongCourse));
    }

    #[test]
    fn validity_window_is_enforced() {
        let item = paid_item(5000);
        let now = now_utc();

        let mut not_yet = coupon(DiscountType::Fixed, 100, 0);
        not_yet.starts_at = Some(now + time::Duration::hours(1));
        assert_eq!(
            coupon_discount(&not_yet, item.course_id, item.unit_price, now),
            Err(CouponError::NotStarted)
        );

        let mut gone = coupon(DiscountType::Fixed, 100, 0);
        gone.expires_at = Some(now - time::Duration::hours(1));
        assert_eq!(
            coupon_discount(&gone, item.course_id, item.unit_price, now),
            Err(CouponError::Expired)
        );

        let mut off = coupon(DiscountType::Fixed, 100, 0);
        off.is_active = false;
        assert_eq!(
            coupon_discount(&off, item.course_id, item.unit_price, now),
            Err(CouponError::Inactive)
        );
    }

    #[test]
    fn first_billable_skips_free_items() {
        let free = LineItem {
            course_id: Uuid::new_v4(),
            unit_price: Decimal::ZERO,
            is_free: true,
        };
        let paid = paid_item(2500);
        let items = vec![free.clone(), paid.clone(), paid_item(900)];
        assert_eq!(first_billable(&items), Some(&paid));
        assert_eq!(first_billable(&[free]), None);
    }

    #[test]
    fn percentage_discount_rounds_to_cents() {
        let item = paid_item(999);
        let third = coupon(DiscountType::Percentage, 33, 0);
        let quote = quote(&item, Some(&third), now_utc());
        assert_eq!(quote.discount, Decimal::new(32967, 2));
        assert_eq!(quote.payable, Decimal::new(999, 0) - Decimal::new(32967, 2));
    }
}
