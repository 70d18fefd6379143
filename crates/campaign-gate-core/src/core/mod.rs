// campaign-gate-core/src/core/mod.rs
// ============================================================================
// Module: Campaign Gate Core Types
// Description: Canonical identifiers, money handling, guardrails, and outcomes.
// Purpose: Provide stable, serializable types shared by every mutation engine.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! Core types define the canonical account and resource identifiers, the
//! micros-based money model, the process-wide guardrail policy, and the
//! uniform outcome shape used by bulk operations. These types are the source
//! of truth for any derived surface (MCP tools or CLIs).

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod guardrails;
pub mod identifiers;
pub mod money;
pub mod outcome;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use guardrails::DryRunReport;
pub use guardrails::GuardrailConfig;
pub use guardrails::GuardrailViolation;
pub use guardrails::MutationIntent;
pub use guardrails::mask_account_id;
pub use guardrails::mask_free_text;
pub use guardrails::mask_params;
pub use identifiers::CustomerId;
pub use identifiers::IdentifierError;
pub use identifiers::ResourceName;
pub use identifiers::ResourceParts;
pub use money::MICROS_PER_UNIT;
pub use money::currency_to_micros;
pub use money::is_valid_date;
pub use money::micros_to_currency;
pub use outcome::ItemError;
pub use outcome::OperationOutcome;
