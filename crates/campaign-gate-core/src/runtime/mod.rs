// campaign-gate-core/src/runtime/mod.rs
// ============================================================================
// Module: Runtime Engines
// Description: Mutation engines orchestrating reads, checks, and writes.
// Purpose: Implement budget, bidding, status, and provisioning flows.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! Each engine owns one mutation flow: read current state through the
//! gateway, validate against guardrails, issue the write, and report what
//! changed. Engines are synchronous and hold no mutable state; the gateway
//! and guardrail configuration are injected at construction.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod bidding;
pub mod budget;
pub mod provision;
pub mod status;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use bidding::BiddingEngine;
pub use bidding::BiddingUpdate;
pub use bidding::BiddingUpdateRequest;
pub use budget::BudgetAdjustment;
pub use budget::BudgetEngine;
pub use budget::BudgetUpdate;
pub use budget::BudgetUpdateRequest;
pub use provision::ProvisioningEngine;
pub use provision::ProvisioningOutcome;
pub use provision::ProvisioningRequest;
pub use provision::ProvisioningStage;
pub use status::CampaignSelector;
pub use status::StatusChange;
pub use status::StatusChangeRequest;
pub use status::StatusEngine;
pub use status::TargetStatus;

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use thiserror::Error;

use crate::core::guardrails::GuardrailViolation;
use crate::core::identifiers::CustomerId;
use crate::core::identifiers::IdentifierError;
use crate::core::identifiers::ResourceName;
use crate::interfaces::GatewayError;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failure raised by a runtime engine.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The request was malformed or inconsistent.
    #[error("validation error: {0}")]
    Validation(String),
    /// A guardrail rejected the operation before execution.
    #[error(transparent)]
    Guardrail(#[from] GuardrailViolation),
    /// A referenced resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// The remote API rejected or failed the request.
    #[error("remote error (status {status}): {body}")]
    Remote {
        /// HTTP status code, or 0 when no response was received.
        status: u16,
        /// Error detail reported by the transport or remote API.
        body: String,
    },
}

impl From<IdentifierError> for EngineError {
    fn from(err: IdentifierError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<GatewayError> for EngineError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Status { status, body } => Self::Remote { status, body },
            GatewayError::Transport(detail) | GatewayError::Decode(detail) => Self::Remote {
                status: 0,
                body: detail,
            },
        }
    }
}

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolves a campaign reference from an identifier or a full resource name.
///
/// Exactly one of the two must be supplied; a full resource name wins and is
/// validated structurally.
pub(crate) fn resolve_campaign(
    customer_id: &CustomerId,
    campaign_id: Option<&str>,
    resource_name: Option<&str>,
) -> Result<ResourceName, EngineError> {
    if let Some(raw) = resource_name {
        let candidate = ResourceName::from_raw(raw);
        candidate.parse()?;
        return Ok(candidate);
    }
    campaign_id.map_or_else(
        || {
            Err(EngineError::Validation(
                "either campaign_id or campaign_resource_name must be provided".to_string(),
            ))
        },
        |id| Ok(ResourceName::campaign(customer_id, id)),
    )
}

// ============================================================================
// SECTION: Row Access
// ============================================================================

/// Walks a nested object path inside a search result row.
fn row_at<'a>(row: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = row;
    for segment in path {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Reads a string field from a search result row.
pub(crate) fn row_str<'a>(row: &'a Value, path: &[&str]) -> Option<&'a str> {
    row_at(row, path).and_then(Value::as_str)
}

/// Reads a micros field from a search result row.
///
/// The REST transport serializes 64-bit integers as JSON strings, so both
/// encodings are accepted.
pub(crate) fn row_micros(row: &Value, path: &[&str]) -> Option<i64> {
    match row_at(row, path)? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.parse().ok(),
        _ => None,
    }
}

/// Reads a floating-point field from a search result row.
pub(crate) fn row_f64(row: &Value, path: &[&str]) -> Option<f64> {
    row_at(row, path).and_then(Value::as_f64)
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

    use serde_json::json;

    use super::EngineError;
    use super::row_f64;
    use super::row_micros;
    use super::row_str;
    use crate::interfaces::GatewayError;

    #[test]
    fn micros_fields_decode_from_strings_and_numbers() {
        let row = json!({"campaignBudget": {"amountMicros": "5000000"}});
        assert_eq!(row_micros(&row, &["campaignBudget", "amountMicros"]), Some(5_000_000));
        let row = json!({"campaignBudget": {"amountMicros": 5_000_000}});
        assert_eq!(row_micros(&row, &["campaignBudget", "amountMicros"]), Some(5_000_000));
    }

    #[test]
    fn missing_paths_read_as_none() {
        let row = json!({"campaign": {"id": "42"}});
        assert_eq!(row_str(&row, &["campaign", "name"]), None);
        assert_eq!(row_f64(&row, &["campaign", "maximizeConversionValue", "targetRoas"]), None);
    }

    #[test]
    fn transport_failures_map_to_status_zero() {
        let err = EngineError::from(GatewayError::Transport("connection refused".to_string()));
        assert_eq!(
            err,
            EngineError::Remote {
                status: 0,
                body: "connection refused".to_string()
            }
        );
    }
}
