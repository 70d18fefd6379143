// campaign-gate-core/tests/properties.rs
// ============================================================================
// Module: Property Tests
// Description: Randomized invariants for money and identifier handling.
// Purpose: Guard conversion exactness and normalization idempotence.
// Dependencies: campaign-gate-core, proptest
// ============================================================================

//! ## Overview
//! Property checks over the numeric and identifier primitives: micros that
//! came from a whole-micros amount survive the currency round trip exactly,
//! and identifier normalization is idempotent and always produces at least
//! ten digits.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::missing_docs_in_private_items,
    reason = "Test-only panic-based assertions are permitted."
)]

use campaign_gate_core::CustomerId;
use campaign_gate_core::currency_to_micros;
use campaign_gate_core::micros_to_currency;
use proptest::prelude::proptest;
use proptest::prop_assert;
use proptest::prop_assert_eq;

proptest! {
    #[test]
    fn whole_micros_survive_the_currency_round_trip(micros in 0_i64..=100_000_000_000) {
        let currency = micros_to_currency(micros);
        prop_assert_eq!(currency_to_micros(currency), micros);
    }

    #[test]
    fn normalization_is_idempotent(raw in "[0-9-]{0,16}") {
        let once = CustomerId::normalize(&raw);
        let twice = CustomerId::normalize(once.as_str());
        prop_assert_eq!(once.as_str(), twice.as_str());
    }

    #[test]
    fn normalized_identifiers_are_at_least_ten_digits(raw in "[0-9-]{0,16}") {
        let normalized = CustomerId::normalize(&raw);
        prop_assert!(normalized.as_str().len() >= 10);
        prop_assert!(normalized.as_str().chars().all(|c| c.is_ascii_digit()));
    }
}
