// campaign-gate-core/src/core/outcome.rs
// ============================================================================
// Module: Operation Outcomes
// Description: Partitioned results for bulk mutating operations.
// Purpose: Preserve partial success so callers see exactly what changed.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Bulk operations partition their per-item results instead of failing
//! wholesale: successes and failures are reported side by side, and the
//! overall outcome counts as successful only when nothing failed. Remote
//! mutations are never rolled back, so a partial outcome reflects durable
//! state.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One failed item within a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemError {
    /// Identifier of the item that failed.
    pub id: String,
    /// Resource name of the item, when it was resolved before failing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    /// Why the item failed.
    pub reason: String,
}

/// Partitioned result of a bulk mutating operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationOutcome<T> {
    /// True only when every item succeeded.
    pub success: bool,
    /// Number of items that succeeded.
    pub updated_count: usize,
    /// Number of items that failed.
    pub failed_count: usize,
    /// Per-item results for the items that succeeded.
    pub succeeded: Vec<T>,
    /// Per-item errors for the items that failed.
    pub failed: Vec<ItemError>,
}

impl<T> OperationOutcome<T> {
    /// Builds an outcome from partitioned per-item results.
    #[must_use]
    pub fn from_parts(succeeded: Vec<T>, failed: Vec<ItemError>) -> Self {
        Self {
            success: failed.is_empty(),
            updated_count: succeeded.len(),
            failed_count: failed.len(),
            succeeded,
            failed,
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::missing_docs_in_private_items,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use super::ItemError;
    use super::OperationOutcome;

    #[test]
    fn all_successes_mark_outcome_successful() {
        let outcome = OperationOutcome::from_parts(vec!["a", "b"], Vec::new());
        assert!(outcome.success);
        assert_eq!(outcome.updated_count, 2);
        assert_eq!(outcome.failed_count, 0);
    }

    #[test]
    fn any_failure_marks_outcome_failed() {
        let failure = ItemError {
            id: "42".to_string(),
            resource_name: None,
            reason: "campaign not found".to_string(),
        };
        let outcome = OperationOutcome::from_parts(vec!["a"], vec![failure]);
        assert!(!outcome.success);
        assert_eq!(outcome.updated_count, 1);
        assert_eq!(outcome.failed_count, 1);
    }
}
