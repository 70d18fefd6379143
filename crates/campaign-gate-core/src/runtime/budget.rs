// campaign-gate-core/src/runtime/budget.rs
// ============================================================================
// Module: Budget Engine
// Description: Campaign budget adjustments over the ads gateway.
// Purpose: Read, compute, check, and write campaign budget amounts.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The budget engine runs the read-compute-check-write protocol: fetch the
//! campaign's current budget, apply the requested adjustment, enforce the
//! floor and the guardrail ceiling on the computed final amount, then issue
//! a partial update against the budget resource. All amounts are carried in
//! micros; currency figures in the result are derived views.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::json;

use crate::core::guardrails::GuardrailConfig;
use crate::core::identifiers::CustomerId;
use crate::core::identifiers::ResourceName;
use crate::core::money::micros_to_currency;
use crate::interfaces::AdsGateway;
use crate::runtime::EngineError;
use crate::runtime::resolve_campaign;
use crate::runtime::row_micros;
use crate::runtime::row_str;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minimum accepted budget, one whole currency unit in micros.
pub const MIN_BUDGET_MICROS: i64 = 1_000_000;
/// Operation label used in guardrail messages.
const OPERATION: &str = "budget_update";

// ============================================================================
// SECTION: Adjustment
// ============================================================================

/// How a budget amount should change.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "adjustment_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetAdjustment {
    /// Replace the budget with an absolute amount.
    Set {
        /// New budget amount in micros.
        amount_micros: i64,
    },
    /// Raise the budget by a percentage of its current amount.
    IncreaseByPercent {
        /// Percentage to add, e.g. `20.0` for a 20% raise.
        percent: f64,
    },
    /// Lower the budget by a percentage of its current amount.
    DecreaseByPercent {
        /// Percentage to subtract.
        percent: f64,
    },
    /// Raise the budget by an absolute amount.
    IncreaseByAmount {
        /// Amount to add in micros.
        amount_micros: i64,
    },
    /// Lower the budget by an absolute amount.
    DecreaseByAmount {
        /// Amount to subtract in micros.
        amount_micros: i64,
    },
}

impl BudgetAdjustment {
    /// Computes the final budget amount for a given current amount.
    ///
    /// Percentage deltas are truncated toward zero before being applied, so
    /// the result is always a whole number of micros.
    #[must_use]
    pub fn apply(&self, current_micros: i64) -> i64 {
        /// Truncating percentage of a micros amount.
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_precision_loss,
            reason = "Percentage deltas are truncated to whole micros intentionally."
        )]
        fn percent_of(current_micros: i64, percent: f64) -> i64 {
            (current_micros as f64 * (percent / 100.0)) as i64
        }
        match *self {
            Self::Set { amount_micros } => amount_micros,
            Self::IncreaseByPercent { percent } => {
                current_micros + percent_of(current_micros, percent)
            }
            Self::DecreaseByPercent { percent } => {
                current_micros - percent_of(current_micros, percent)
            }
            Self::IncreaseByAmount { amount_micros } => current_micros + amount_micros,
            Self::DecreaseByAmount { amount_micros } => current_micros - amount_micros,
        }
    }
}

// ============================================================================
// SECTION: Request and Result
// ============================================================================

/// Request to adjust one campaign's budget.
#[derive(Debug, Clone, Deserialize)]
pub struct BudgetUpdateRequest {
    /// Account owning the campaign, in any accepted identifier format.
    pub customer_id: String,
    /// Campaign identifier, when not addressing by resource name.
    #[serde(default)]
    pub campaign_id: Option<String>,
    /// Full campaign resource name, when known.
    #[serde(default)]
    pub campaign_resource_name: Option<String>,
    /// Adjustment to apply.
    #[serde(flatten)]
    pub adjustment: BudgetAdjustment,
}

/// Result of a completed budget adjustment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetUpdate {
    /// Budget resource that was written.
    pub budget_resource_name: ResourceName,
    /// Campaign the budget belongs to.
    pub campaign_resource_name: ResourceName,
    /// Campaign display name.
    pub campaign_name: String,
    /// Budget before the write, in micros.
    pub previous_amount_micros: i64,
    /// Budget after the write, in micros.
    pub new_amount_micros: i64,
    /// Budget before the write, in currency units.
    pub previous_amount_currency: f64,
    /// Budget after the write, in currency units.
    pub new_amount_currency: f64,
    /// Signed change in micros.
    pub change_micros: i64,
    /// Signed change in currency units.
    pub change_currency: f64,
    /// Signed change as a percentage of the previous amount, zero when the
    /// previous amount was zero.
    pub change_percent: f64,
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Engine for campaign budget adjustments.
pub struct BudgetEngine {
    /// Gateway used for reads and writes.
    gateway: Arc<dyn AdsGateway>,
    /// Guardrail limits applied to computed final amounts.
    guardrails: GuardrailConfig,
}

impl BudgetEngine {
    /// Creates an engine over the given gateway and guardrails.
    #[must_use]
    pub fn new(gateway: Arc<dyn AdsGateway>, guardrails: GuardrailConfig) -> Self {
        Self { gateway, guardrails }
    }

    /// Applies a budget adjustment and reports the before and after amounts.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the request is invalid, the campaign
    /// does not exist, the computed amount violates the floor or a
    /// guardrail, or the remote write fails.
    pub fn update(&self, request: &BudgetUpdateRequest) -> Result<BudgetUpdate, EngineError> {
        let customer_id = CustomerId::normalize(&request.customer_id);
        let campaign_resource_name = resolve_campaign(
            &customer_id,
            request.campaign_id.as_deref(),
            request.campaign_resource_name.as_deref(),
        )?;

        let query = format!(
            "SELECT campaign.id, campaign.name, campaign.campaign_budget, \
             campaign_budget.amount_micros FROM campaign \
             WHERE campaign.resource_name = '{}'",
            campaign_resource_name.as_str()
        );
        let rows = self.gateway.search(&customer_id, &query)?;
        let row = rows.first().ok_or_else(|| {
            EngineError::NotFound(format!("campaign not found: {}", campaign_resource_name.as_str()))
        })?;

        let budget_resource_name = row_str(row, &["campaign", "campaignBudget"])
            .map(ResourceName::from_raw)
            .ok_or_else(|| {
                EngineError::Validation("search row is missing campaign.campaign_budget".to_string())
            })?;
        let campaign_name =
            row_str(row, &["campaign", "name"]).unwrap_or_default().to_string();
        let current_micros =
            row_micros(row, &["campaignBudget", "amountMicros"]).unwrap_or_default();

        let final_micros = request.adjustment.apply(current_micros);
        if final_micros < 0 {
            return Err(EngineError::Validation(format!(
                "resulting budget would be negative: {final_micros}"
            )));
        }
        if final_micros < MIN_BUDGET_MICROS {
            return Err(EngineError::Validation(format!(
                "budget too low: {final_micros} micros (minimum: {MIN_BUDGET_MICROS})"
            )));
        }
        self.guardrails.check_budget(OPERATION, final_micros)?;

        let operation = json!({
            "update": {
                "resourceName": budget_resource_name.as_str(),
                "amountMicros": final_micros.to_string(),
            },
            "updateMask": "amountMicros",
        });
        self.gateway.mutate(&customer_id, "campaignBudgets", operation)?;

        let change_micros = final_micros - current_micros;
        #[allow(
            clippy::cast_precision_loss,
            reason = "Percentage change is a reporting figure, not an exact amount."
        )]
        let change_percent = if current_micros > 0 {
            change_micros as f64 / current_micros as f64 * 100.0
        } else {
            0.0
        };
        Ok(BudgetUpdate {
            budget_resource_name,
            campaign_resource_name,
            campaign_name,
            previous_amount_micros: current_micros,
            new_amount_micros: final_micros,
            previous_amount_currency: micros_to_currency(current_micros),
            new_amount_currency: micros_to_currency(final_micros),
            change_micros,
            change_currency: micros_to_currency(change_micros),
            change_percent,
        })
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
