//! Money arithmetic for memo totals.
//!
//! Every currency figure in the engine flows through [`round2`] and [`sum`]
//! so the grand total packaged for submission is identical to the one the
//! presentation layer displays.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to 2 decimal places with half-up (midpoint away from zero) rounding.
pub fn round2(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Sum a sequence of amounts, rounded to 2 decimal places.
pub fn sum<I>(amounts: I) -> Decimal
where
    I: IntoIterator<Item = Decimal>,
{
    round2(amounts.into_iter().sum())
}

/// Normalize a raw numeric arriving from a form field or upstream payload.
///
/// Non-finite values and negatives collapse to zero instead of poisoning
/// downstream totals.
pub fn normalize(raw: f64) -> Decimal {
    if !raw.is_finite() || raw < 0.0 {
        return Decimal::ZERO;
    }
    Decimal::from_f64_retain(raw).map(round2).unwrap_or(Decimal::ZERO)
}

/// Clamp a quantity or price to the non-negative range.
pub fn clamp_non_negative(value: Decimal) -> Decimal {
    if value.is_sign_negative() {
        Decimal::ZERO
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round2_half_up() {
        assert_eq!(round2(dec("1.005")), dec("1.01"));
        assert_eq!(round2(dec("1.004")), dec("1.00"));
        assert_eq!(round2(dec("-1.005")), dec("-1.01"));
        assert_eq!(round2(dec("2.5")), dec("2.5"));
    }

    #[test]
    fn test_sum_rounds_once() {
        let total = sum(vec![dec("0.105"), dec("0.105"), dec("0.105")]);
        assert_eq!(total, dec("0.32"));
    }

    #[test]
    fn test_sum_empty_is_zero() {
        assert_eq!(sum(Vec::<Decimal>::new()), Decimal::ZERO);
    }

    #[test]
    fn test_normalize_rejects_non_finite() {
        assert_eq!(normalize(f64::NAN), Decimal::ZERO);
        assert_eq!(normalize(f64::INFINITY), Decimal::ZERO);
        assert_eq!(normalize(-3.5), Decimal::ZERO);
        assert_eq!(normalize(12.345), dec("12.35"));
    }

    #[test]
    fn test_clamp_non_negative() {
        assert_eq!(clamp_non_negative(dec("-0.01")), Decimal::ZERO);
        assert_eq!(clamp_non_negative(dec("4.20")), dec("4.20"));
    }
}
