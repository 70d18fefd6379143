// campaign-gate-core/src/runtime/status.rs
// ============================================================================
// Module: Status Engine
// Description: Bulk pause and enable operations over campaigns.
// Purpose: Resolve campaign selections and flip status with safety checks.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Pauses or enables campaigns selected by identifier, identifier list,
//! resource name, or name pattern. Bulk-size and confirmation guardrails run
//! after the selection is resolved, so pattern matches are bounded like
//! explicit lists. Each campaign is mutated individually and failures are
//! partitioned per item; enabling additionally runs a safety check that
//! refuses campaigns without a usable budget.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::json;

use crate::core::guardrails::GuardrailConfig;
use crate::core::guardrails::GuardrailViolation;
use crate::core::identifiers::CustomerId;
use crate::core::identifiers::ResourceName;
use crate::core::outcome::ItemError;
use crate::core::outcome::OperationOutcome;
use crate::interfaces::AdsGateway;
use crate::runtime::EngineError;
use crate::runtime::budget::MIN_BUDGET_MICROS;
use crate::runtime::row_micros;
use crate::runtime::row_str;

// ============================================================================
// SECTION: Target Status
// ============================================================================

/// Status a campaign can be driven to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetStatus {
    /// Campaign is stopped and spends nothing.
    #[default]
    Paused,
    /// Campaign is serving.
    Enabled,
}

impl TargetStatus {
    /// Wire value of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Paused => "PAUSED",
            Self::Enabled => "ENABLED",
        }
    }
}

impl fmt::Display for TargetStatus {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Selection
// ============================================================================

/// Request to change the status of one or more campaigns.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusChangeRequest {
    /// Account owning the campaigns, in any accepted identifier format.
    pub customer_id: String,
    /// Single campaign identifier.
    #[serde(default)]
    pub campaign_id: Option<String>,
    /// Explicit list of campaign identifiers.
    #[serde(default)]
    pub campaign_ids: Option<Vec<String>>,
    /// Full campaign resource name.
    #[serde(default)]
    pub campaign_resource_name: Option<String>,
    /// Name pattern with `*` wildcards, resolved remotely. Requires
    /// `confirm` before the lookup is allowed to run.
    #[serde(default)]
    pub name_pattern: Option<String>,
    /// Explicit confirmation for multi-item and pattern operations.
    #[serde(default)]
    pub confirm: bool,
    /// Run the budget safety check before enabling.
    #[serde(default = "default_safety_check")]
    pub safety_check: bool,
}

/// Safety checks default to on.
const fn default_safety_check() -> bool {
    true
}

/// Resolved form of the campaign selection carried by a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CampaignSelector {
    /// One campaign addressed by identifier.
    Single(String),
    /// Several campaigns addressed by identifier.
    Many(Vec<String>),
    /// One campaign addressed by full resource name.
    ByResourceName(String),
    /// Campaigns whose names match a wildcard pattern.
    ByNamePattern(String),
}

impl StatusChangeRequest {
    /// Extracts the selector, requiring exactly one selection field.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] when zero or several selection
    /// fields are present.
    pub fn selector(&self) -> Result<CampaignSelector, EngineError> {
        let mut selectors = Vec::new();
        if let Some(id) = &self.campaign_id {
            selectors.push(CampaignSelector::Single(id.clone()));
        }
        if let Some(ids) = &self.campaign_ids {
            selectors.push(CampaignSelector::Many(ids.clone()));
        }
        if let Some(name) = &self.campaign_resource_name {
            selectors.push(CampaignSelector::ByResourceName(name.clone()));
        }
        if let Some(pattern) = &self.name_pattern {
            selectors.push(CampaignSelector::ByNamePattern(pattern.clone()));
        }
        match selectors.len() {
            1 => Ok(selectors.remove(0)),
            0 => Err(EngineError::Validation(
                "one of campaign_id, campaign_ids, campaign_resource_name, or name_pattern \
                 must be provided"
                    .to_string(),
            )),
            _ => Err(EngineError::Validation(
                "campaign selection fields are mutually exclusive".to_string(),
            )),
        }
    }
}

// ============================================================================
// SECTION: Result
// ============================================================================

/// One campaign whose status was changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    /// Campaign identifier.
    pub campaign_id: String,
    /// Campaign resource name.
    pub campaign_resource_name: ResourceName,
    /// Status before the write; `UNKNOWN` because the previous state is not
    /// queried.
    pub previous_status: String,
    /// Status after the write.
    pub new_status: TargetStatus,
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Engine for bulk campaign status changes.
pub struct StatusEngine {
    /// Gateway used for reads and writes.
    gateway: Arc<dyn AdsGateway>,
    /// Guardrail limits applied after selection resolution.
    guardrails: GuardrailConfig,
}

impl StatusEngine {
    /// Creates an engine over the given gateway and guardrails.
    #[must_use]
    pub fn new(gateway: Arc<dyn AdsGateway>, guardrails: GuardrailConfig) -> Self {
        Self { gateway, guardrails }
    }

    /// Pauses the selected campaigns. Pausing never runs safety checks.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the request is invalid, the selection
    /// resolves to nothing, or a guardrail rejects the operation. Per-item
    /// remote failures are reported in the outcome, not as an error.
    pub fn pause(
        &self,
        request: &StatusChangeRequest,
    ) -> Result<OperationOutcome<StatusChange>, EngineError> {
        self.set_status(request, TargetStatus::Paused, false)
    }

    /// Enables the selected campaigns, running the budget safety check
    /// unless the request disables it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the request is invalid, the selection
    /// resolves to nothing, or a guardrail rejects the operation. Per-item
    /// remote and safety failures are reported in the outcome.
    pub fn enable(
        &self,
        request: &StatusChangeRequest,
    ) -> Result<OperationOutcome<StatusChange>, EngineError> {
        self.set_status(request, TargetStatus::Enabled, request.safety_check)
    }

    /// Shared pause/enable flow.
    fn set_status(
        &self,
        request: &StatusChangeRequest,
        target: TargetStatus,
        safety_check: bool,
    ) -> Result<OperationOutcome<StatusChange>, EngineError> {
        let customer_id = CustomerId::normalize(&request.customer_id);
        let operation_label = match target {
            TargetStatus::Paused => "campaigns_pause",
            TargetStatus::Enabled => "campaigns_enable",
        };

        let selector = request.selector()?;
        if matches!(selector, CampaignSelector::ByNamePattern(_)) && !request.confirm {
            return Err(GuardrailViolation(format!(
                "{operation_label}: pattern matching requires confirm=true to prevent accidental \
                 bulk operations"
            ))
            .into());
        }

        let targets = self.resolve_targets(&customer_id, selector)?;
        if targets.is_empty() {
            return Err(EngineError::NotFound("no campaigns matched the selection".to_string()));
        }
        if targets.len() > 1 {
            self.guardrails.check_bulk(operation_label, targets.len())?;
            self.guardrails.check_confirmation(operation_label, request.confirm, targets.len())?;
        }

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();
        for (campaign_id, resource_name) in targets {
            if safety_check {
                let issues = self.safety_issues(&customer_id, &resource_name);
                if !issues.is_empty() {
                    failed.push(ItemError {
                        id: campaign_id,
                        resource_name: Some(resource_name.as_str().to_string()),
                        reason: format!("safety check failed: {}", issues.join("; ")),
                    });
                    continue;
                }
            }
            let operation = json!({
                "update": {
                    "resourceName": resource_name.as_str(),
                    "status": target.as_str(),
                },
                "updateMask": "status",
            });
            match self.gateway.mutate(&customer_id, "campaigns", operation) {
                Ok(_) => succeeded.push(StatusChange {
                    campaign_id,
                    campaign_resource_name: resource_name,
                    previous_status: "UNKNOWN".to_string(),
                    new_status: target,
                }),
                Err(err) => failed.push(ItemError {
                    id: campaign_id,
                    resource_name: Some(resource_name.as_str().to_string()),
                    reason: err.to_string(),
                }),
            }
        }
        Ok(OperationOutcome::from_parts(succeeded, failed))
    }

    /// Resolves a selector into `(campaign_id, resource_name)` pairs.
    fn resolve_targets(
        &self,
        customer_id: &CustomerId,
        selector: CampaignSelector,
    ) -> Result<Vec<(String, ResourceName)>, EngineError> {
        match selector {
            CampaignSelector::Single(id) => {
                let resource_name = ResourceName::campaign(customer_id, &id);
                Ok(vec![(id, resource_name)])
            }
            CampaignSelector::Many(ids) => Ok(ids
                .into_iter()
                .map(|id| {
                    let resource_name = ResourceName::campaign(customer_id, &id);
                    (id, resource_name)
                })
                .collect()),
            CampaignSelector::ByResourceName(raw) => {
                let resource_name = ResourceName::from_raw(&raw);
                let parts = resource_name.parse()?;
                Ok(vec![(parts.resource_id, resource_name)])
            }
            CampaignSelector::ByNamePattern(pattern) => {
                self.find_by_pattern(customer_id, &pattern)
            }
        }
    }

    /// Finds campaigns whose names match a `*` wildcard pattern.
    fn find_by_pattern(
        &self,
        customer_id: &CustomerId,
        pattern: &str,
    ) -> Result<Vec<(String, ResourceName)>, EngineError> {
        let like_pattern = pattern.replace('*', "%");
        let query = format!(
            "SELECT campaign.id, campaign.name FROM campaign \
             WHERE campaign.name LIKE '{like_pattern}'"
        );
        let rows = self.gateway.search(customer_id, &query)?;
        Ok(rows
            .iter()
            .filter_map(|row| row_str(row, &["campaign", "id"]))
            .map(|id| {
                let resource_name = ResourceName::campaign(customer_id, id);
                (id.to_string(), resource_name)
            })
            .collect())
    }

    /// Collects reasons a campaign is not safe to enable.
    ///
    /// Query failures are reported as issues so a broken read blocks the
    /// enable instead of silently passing it.
    fn safety_issues(&self, customer_id: &CustomerId, resource_name: &ResourceName) -> Vec<String> {
        let query = format!(
            "SELECT campaign.id, campaign.name, campaign.campaign_budget, \
             campaign_budget.amount_micros, campaign.advertising_channel_type \
             FROM campaign WHERE campaign.resource_name = '{}'",
            resource_name.as_str()
        );
        let rows = match self.gateway.search(customer_id, &query) {
            Ok(rows) => rows,
            Err(err) => return vec![format!("could not query campaign: {err}")],
        };
        let Some(row) = rows.first() else {
            return vec!["campaign not found".to_string()];
        };
        let budget_micros =
            row_micros(row, &["campaignBudget", "amountMicros"]).unwrap_or_default();
        let mut issues = Vec::new();
        if budget_micros <= 0 {
            issues.push("campaign has no budget or budget is 0".to_string());
        } else if budget_micros < MIN_BUDGET_MICROS {
            issues.push(format!("campaign budget is very low: {budget_micros} micros"));
        }
        issues
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
