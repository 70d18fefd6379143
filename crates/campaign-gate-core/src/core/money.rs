// campaign-gate-core/src/core/money.rs
// ============================================================================
// Module: Money and Date Conversion
// Description: Micros-based currency arithmetic and date validation.
// Purpose: Keep all budget arithmetic in exact integer micros.
// Dependencies: time
// ============================================================================

//! ## Overview
//! All monetary amounts are carried internally in micros (1,000,000 micros
//! per currency unit) so budget arithmetic never accumulates floating-point
//! drift. The currency-float form is derived for display only. Conversion
//! from currency to micros floors fractional micros, so round-trips are lossy
//! beyond six decimal places of the original currency value by design.

// ============================================================================
// SECTION: Imports
// ============================================================================

use time::Date;
use time::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Micros per unit of account currency.
pub const MICROS_PER_UNIT: i64 = 1_000_000;

// ============================================================================
// SECTION: Conversions
// ============================================================================

/// Converts an amount in micros to currency units for display.
#[must_use]
#[allow(clippy::cast_precision_loss, reason = "Display-only conversion of bounded budget values.")]
pub fn micros_to_currency(micros: i64) -> f64 {
    micros as f64 / MICROS_PER_UNIT as f64
}

/// Converts a currency amount to micros, flooring fractional micros.
///
/// Values within float error of a whole number of micros are snapped to that
/// integer before flooring, so currency values derived from integer micros
/// convert back to the exact micros they came from.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    reason = "Budget amounts are bounded far below the exact-integer range of f64."
)]
pub fn currency_to_micros(amount: f64) -> i64 {
    let scaled = amount * MICROS_PER_UNIT as f64;
    let nearest = scaled.round();
    let tolerance = (scaled.abs() * 1e-12).max(1e-6);
    if (scaled - nearest).abs() <= tolerance {
        nearest as i64
    } else {
        scaled.floor() as i64
    }
}

// ============================================================================
// SECTION: Date Validation
// ============================================================================

/// Returns true when the input is a calendar-valid `YYYY-MM-DD` date.
#[must_use]
pub fn is_valid_date(value: &str) -> bool {
    let Ok(format) = format_description::parse("[year]-[month]-[day]") else {
        return false;
    };
    Date::parse(value, &format).is_ok()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::missing_docs_in_private_items,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use super::currency_to_micros;
    use super::is_valid_date;
    use super::micros_to_currency;

    #[test]
    fn micros_to_currency_is_exact_for_integer_results() {
        assert_eq!(micros_to_currency(1_500_000_000), 1_500.0);
        assert_eq!(micros_to_currency(0), 0.0);
    }

    #[test]
    fn currency_to_micros_scales_whole_units() {
        assert_eq!(currency_to_micros(1_500.0), 1_500_000_000);
        assert_eq!(currency_to_micros(0.5), 500_000);
    }

    #[test]
    fn currency_to_micros_floors_sub_micro_fractions() {
        assert_eq!(currency_to_micros(0.000_000_4), 0);
        assert_eq!(currency_to_micros(1.000_000_9), 1_000_000);
    }

    #[test]
    fn round_trip_preserves_integer_micros() {
        for micros in [0_i64, 1, 999, 1_000_000, 123_456_789, 100_000_000_000] {
            assert_eq!(currency_to_micros(micros_to_currency(micros)), micros);
        }
    }

    #[test]
    fn valid_dates_parse() {
        assert!(is_valid_date("2025-01-31"));
        assert!(is_valid_date("2024-02-29"));
    }

    #[test]
    fn invalid_dates_are_rejected() {
        assert!(!is_valid_date("2025-13-01"));
        assert!(!is_valid_date("2025-02-30"));
        assert!(!is_valid_date("2025/01/31"));
        assert!(!is_valid_date("20250131"));
        assert!(!is_valid_date("not-a-date"));
    }
}
