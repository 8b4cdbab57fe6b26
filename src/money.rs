//! Centavo arithmetic on amounts that come from requests or staff-edited rows.
//!
//! Every product of a price and a quantity, and every running total, goes
//! through here so an oversized value is a `400` instead of a wrapped sum.

use crate::error::{AppError, AppResult};

fn too_large() -> AppError {
    AppError::BadRequest("amount is too large".into())
}

/// `unit * quantity` in centavos.
pub fn line_total(unit: i64, quantity: i32) -> AppResult<i64> {
    unit.checked_mul(i64::from(quantity)).ok_or_else(too_large)
}

pub fn add(a: i64, b: i64) -> AppResult<i64> {
    a.checked_add(b).ok_or_else(too_large)
}

pub fn sum<I>(amounts: I) -> AppResult<i64>
where
    I: IntoIterator<Item = i64>,
{
    amounts
        .into_iter()
        .try_fold(0_i64, |acc, amount| acc.checked_add(amount))
        .ok_or_else(too_large)
}

/// Stock after receiving `received` more units.
pub fn restock(stock: i32, received: i32) -> AppResult<i32> {
    stock
        .checked_add(received)
        .ok_or_else(|| AppError::BadRequest("stock level is too large".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_total_multiplies() {
        assert_eq!(line_total(45_000, 3).unwrap(), 135_000);
    }

    #[test]
    fn oversized_line_total_is_a_bad_request() {
        let err = line_total(i64::MAX / 2, 3).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn sum_stops_at_overflow() {
        assert_eq!(sum([1, 2, 3]).unwrap(), 6);
        assert!(sum([i64::MAX, 1]).is_err());
        assert!(add(i64::MAX, 1).is_err());
    }

    #[test]
    fn restock_rejects_overflowing_stock() {
        assert_eq!(restock(5, 10).unwrap(), 15);
        assert!(restock(i32::MAX, 1).is_err());
    }
}
