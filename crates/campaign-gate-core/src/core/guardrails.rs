// campaign-gate-core/src/core/guardrails.rs
// ============================================================================
// Module: Guardrail Engine
// Description: Process-wide safety policy for mutating operations.
// Purpose: Reject unsafe mutations before any network call is issued.
// Dependencies: regex, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! The guardrail engine is a pure policy filter consulted before every
//! mutating operation: budget ceilings, bulk-size ceilings, confirmation
//! requirements, and target-ROAS sanity bounds. Dry-run mode short-circuits
//! execution and reports what would happen, with account identifiers masked
//! and would-be violations downgraded to advisory warnings. All checks run
//! strictly before any state-changing call, so a rejected request has no
//! partial side effects.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::money::micros_to_currency;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minimum accepted target ROAS.
pub const MIN_TARGET_ROAS: f64 = 0.01;
/// Maximum accepted target ROAS.
pub const MAX_TARGET_ROAS: f64 = 100.0;
/// Number of trailing characters left visible when masking identifiers.
const MASK_VISIBLE_SUFFIX: usize = 4;

/// Matches bearer credentials embedded in free text.
static BEARER_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(bearer\s+)[\w.~+/-]+").ok());
/// Matches token-valued fields embedded in free text.
static TOKEN_FIELD_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"(?i)(token["']?\s*[:=]\s*["']?)[\w.~+/-]+"#).ok());
/// Matches ten-digit account identifiers embedded in free text.
static LONG_ID_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\b\d{6}(\d{4})\b").ok());

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Process-wide guardrail limits.
///
/// # Invariants
/// - Constructed once at process start and never mutated; engines receive it
///   by value per call, so tests can isolate configurations without touching
///   process state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuardrailConfig {
    /// Report intended mutations without issuing them.
    pub dry_run: bool,
    /// Require explicit confirmation for operations affecting more than one
    /// item.
    pub require_confirmation: bool,
    /// Maximum budget accepted for any single budget write, in micros.
    pub max_budget_micros: i64,
    /// Maximum number of items accepted in one bulk operation.
    pub max_bulk_count: usize,
}

impl Default for GuardrailConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            require_confirmation: true,
            max_budget_micros: 100_000_000_000,
            max_bulk_count: 50,
        }
    }
}

// ============================================================================
// SECTION: Mutation Intent
// ============================================================================

/// Typed summary of a would-be mutation, used for pre-execution checks.
///
/// Replaces argument-bag inspection: each tool builds an intent from its
/// typed request before the guardrail engine is consulted.
#[derive(Debug, Clone, Default)]
pub struct MutationIntent {
    /// Budget amount the operation would write, when known up front.
    pub budget_micros: Option<i64>,
    /// Target ROAS the operation would write, when present.
    pub target_roas: Option<f64>,
    /// Number of items the operation would affect.
    pub affected_count: usize,
    /// Whether the caller explicitly confirmed the operation.
    pub confirm: bool,
}

// ============================================================================
// SECTION: Checks
// ============================================================================

impl GuardrailConfig {
    /// Validates a budget amount against the configured ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`GuardrailViolation`] when the amount is negative or exceeds
    /// the ceiling.
    pub fn check_budget(&self, operation: &str, amount_micros: i64) -> Result<(), GuardrailViolation> {
        if amount_micros < 0 {
            return Err(GuardrailViolation(format!("{operation}: budget cannot be negative")));
        }
        if amount_micros > self.max_budget_micros {
            return Err(GuardrailViolation(format!(
                "{operation}: budget {:.2} exceeds maximum {:.2}",
                micros_to_currency(amount_micros),
                micros_to_currency(self.max_budget_micros)
            )));
        }
        Ok(())
    }

    /// Validates a bulk operation size against the configured ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`GuardrailViolation`] when the count is zero or exceeds the
    /// ceiling.
    pub fn check_bulk(&self, operation: &str, count: usize) -> Result<(), GuardrailViolation> {
        if count < 1 {
            return Err(GuardrailViolation(format!(
                "{operation}: operation must affect at least 1 campaign"
            )));
        }
        if count > self.max_bulk_count {
            return Err(GuardrailViolation(format!(
                "{operation}: operation affects {count} campaigns, exceeds maximum {}",
                self.max_bulk_count
            )));
        }
        Ok(())
    }

    /// Requires explicit confirmation for multi-item operations.
    ///
    /// Single-item operations never require confirmation, regardless of the
    /// confirmation flag.
    ///
    /// # Errors
    ///
    /// Returns [`GuardrailViolation`] when confirmation is required but
    /// absent.
    pub fn check_confirmation(
        &self,
        operation: &str,
        confirm: bool,
        affected_count: usize,
    ) -> Result<(), GuardrailViolation> {
        if !self.require_confirmation || affected_count <= 1 || confirm {
            return Ok(());
        }
        Err(GuardrailViolation(format!(
            "{operation}: confirmation required for bulk operation affecting {affected_count} \
             items; set confirm=true to proceed"
        )))
    }

    /// Validates a target ROAS against sanity bounds.
    ///
    /// # Errors
    ///
    /// Returns [`GuardrailViolation`] when the value is outside
    /// [`MIN_TARGET_ROAS`]..=[`MAX_TARGET_ROAS`].
    pub fn check_roas(operation: &str, roas: f64) -> Result<(), GuardrailViolation> {
        if roas < MIN_TARGET_ROAS {
            return Err(GuardrailViolation(format!(
                "{operation}: target ROAS {roas} is too low (minimum: {MIN_TARGET_ROAS})"
            )));
        }
        if roas > MAX_TARGET_ROAS {
            return Err(GuardrailViolation(format!(
                "{operation}: target ROAS {roas} is unreasonably high (maximum: {MAX_TARGET_ROAS})"
            )));
        }
        Ok(())
    }

    /// Runs every applicable check for a typed mutation intent.
    ///
    /// # Errors
    ///
    /// Returns the first [`GuardrailViolation`] encountered; the operation
    /// must not be attempted in that case.
    pub fn preflight(
        &self,
        operation: &str,
        intent: &MutationIntent,
    ) -> Result<(), GuardrailViolation> {
        if let Some(amount) = intent.budget_micros {
            self.check_budget(operation, amount)?;
        }
        if let Some(roas) = intent.target_roas {
            Self::check_roas(operation, roas)?;
        }
        if intent.affected_count > 1 {
            self.check_bulk(operation, intent.affected_count)?;
            self.check_confirmation(operation, intent.confirm, intent.affected_count)?;
        }
        Ok(())
    }

    /// Builds the dry-run report for a would-be mutation.
    ///
    /// Violations surface as advisory warnings rather than hard failures so
    /// operators can preview risk without blocking on it. Parameters are
    /// masked before inclusion.
    #[must_use]
    pub fn dry_run_report(
        &self,
        operation: &str,
        params: &Value,
        intent: &MutationIntent,
    ) -> DryRunReport {
        let mut warnings = Vec::new();
        if let Some(amount) = intent.budget_micros
            && let Err(violation) = self.check_budget(operation, amount)
        {
            warnings.push(violation.to_string());
        }
        if let Some(roas) = intent.target_roas
            && let Err(violation) = Self::check_roas(operation, roas)
        {
            warnings.push(violation.to_string());
        }
        if intent.affected_count > 1 {
            if let Err(violation) = self.check_bulk(operation, intent.affected_count) {
                warnings.push(violation.to_string());
            }
            if let Err(violation) =
                self.check_confirmation(operation, intent.confirm, intent.affected_count)
            {
                warnings.push(violation.to_string());
            }
        }
        DryRunReport {
            dry_run: true,
            operation: operation.to_string(),
            would_execute: warnings.is_empty(),
            params: mask_params(params),
            warnings,
            message: "This is a DRY RUN. No actual changes were made.",
        }
    }
}

// ============================================================================
// SECTION: Dry-Run Report
// ============================================================================

/// Result of a dry-run interception.
#[derive(Debug, Clone, Serialize)]
pub struct DryRunReport {
    /// Always true; distinguishes dry-run payloads from live outcomes.
    pub dry_run: bool,
    /// Operation that would have executed.
    pub operation: String,
    /// True when no guardrail would have rejected the operation.
    pub would_execute: bool,
    /// Request parameters with sensitive values masked.
    pub params: Value,
    /// Advisory warnings for checks that would have failed.
    pub warnings: Vec<String>,
    /// Fixed operator-facing notice.
    pub message: &'static str,
}

// ============================================================================
// SECTION: Masking
// ============================================================================

/// Masks all but the last four characters of an identifier.
#[must_use]
pub fn mask_account_id(id: &str) -> String {
    let chars: Vec<char> = id.chars().collect();
    if chars.len() <= MASK_VISIBLE_SUFFIX {
        return id.to_string();
    }
    let visible: String = chars[chars.len() - MASK_VISIBLE_SUFFIX..].iter().collect();
    format!("{}{visible}", "*".repeat(chars.len() - MASK_VISIBLE_SUFFIX))
}

/// Masks bearer credentials, token fields, and long account identifiers
/// embedded in free text, independent of which field carries them.
#[must_use]
pub fn mask_free_text(text: &str) -> String {
    let mut masked = text.to_string();
    if let Some(pattern) = LONG_ID_PATTERN.as_ref() {
        masked = pattern.replace_all(&masked, "******${1}").into_owned();
    }
    if let Some(pattern) = BEARER_PATTERN.as_ref() {
        masked = pattern.replace_all(&masked, "${1}****").into_owned();
    }
    if let Some(pattern) = TOKEN_FIELD_PATTERN.as_ref() {
        masked = pattern.replace_all(&masked, "${1}****").into_owned();
    }
    masked
}

/// Returns true for field names that carry account-level identifiers.
fn is_id_key(key: &str) -> bool {
    matches!(key, "customer_id" | "account_id" | "login_customer_id" | "merchant_center_id")
}

/// Recursively masks sensitive values in a JSON parameter payload.
#[must_use]
pub fn mask_params(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut masked = serde_json::Map::with_capacity(map.len());
            for (key, entry) in map {
                let replacement = match entry {
                    Value::String(text) if is_id_key(key) => {
                        Value::String(mask_account_id(text))
                    }
                    _ => mask_params(entry),
                };
                masked.insert(key.clone(), replacement);
            }
            Value::Object(masked)
        }
        Value::Array(items) => Value::Array(items.iter().map(mask_params).collect()),
        Value::String(text) => Value::String(mask_free_text(text)),
        other => other.clone(),
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Policy rejection raised before any network call is issued.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("guardrail violation: {0}")]
pub struct GuardrailViolation(pub String);

// ============================================================================
// SECTION: Tests
// ============================================================================
