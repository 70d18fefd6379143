// campaign-gate-core/src/runtime/provision.rs
// ============================================================================
// Module: Provisioning Engine
// Description: Multi-step creation of value-maximizing campaigns.
// Purpose: Chain budget, campaign, asset group, and feed attachment writes.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Provisions a complete Performance Max campaign: a dedicated budget, the
//! campaign itself, an optional asset group, and an optional Merchant Center
//! feed attachment. All inputs are validated before the first write. Remote
//! writes are never rolled back; when a step fails, the outcome reports
//! every resource created so far together with the failed stage, so the
//! caller can resume or clean up deliberately.

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
use crate::core::money::currency_to_micros;
use crate::core::money::is_valid_date;
use crate::interfaces::AdsGateway;
use crate::runtime::EngineError;
use crate::runtime::budget::MIN_BUDGET_MICROS;
use crate::runtime::status::TargetStatus;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Operation label used in guardrail messages.
const OPERATION: &str = "campaign_create";
/// Maximum accepted campaign name length.
const MAX_NAME_LENGTH: usize = 255;

// ============================================================================
// SECTION: Request
// ============================================================================

/// Request to provision a complete campaign.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvisioningRequest {
    /// Account the campaign is created in, in any accepted identifier
    /// format.
    pub customer_id: String,
    /// Campaign display name.
    pub campaign_name: String,
    /// Daily budget in micros; mutually exclusive with the currency form.
    #[serde(default)]
    pub daily_budget_micros: Option<i64>,
    /// Daily budget in currency units; mutually exclusive with the micros
    /// form.
    #[serde(default)]
    pub daily_budget_currency: Option<f64>,
    /// Optional target ROAS for the bidding strategy.
    #[serde(default)]
    pub target_roas: Option<f64>,
    /// Optional Merchant Center account to attach.
    #[serde(default)]
    pub merchant_center_id: Option<String>,
    /// Optional feed label filter for the attached feed.
    #[serde(default)]
    pub feed_label: Option<String>,
    /// Optional start date in `YYYY-MM-DD` form.
    #[serde(default)]
    pub start_date: Option<String>,
    /// Optional end date in `YYYY-MM-DD` form.
    #[serde(default)]
    pub end_date: Option<String>,
    /// Initial campaign status.
    #[serde(default)]
    pub status: TargetStatus,
    /// Optional landing URL; when present an asset group is created.
    #[serde(default)]
    pub final_url: Option<String>,
    /// Optional asset group name, defaulted from the campaign name.
    #[serde(default)]
    pub asset_group_name: Option<String>,
}

// ============================================================================
// SECTION: Outcome
// ============================================================================

/// Step of the provisioning chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProvisioningStage {
    /// Creating the campaign budget.
    Budget,
    /// Creating the campaign.
    Campaign,
    /// Creating the asset group.
    AssetGroup,
    /// Attaching the Merchant Center feed.
    FeedAttachment,
}

/// Result of a provisioning run, partial on failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProvisioningOutcome {
    /// True only when every requested step completed.
    pub success: bool,
    /// Sanitized campaign name.
    pub campaign_name: String,
    /// Initial campaign status.
    pub status: TargetStatus,
    /// Budget resource, present once the budget step completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_resource_name: Option<ResourceName>,
    /// Campaign resource, present once the campaign step completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_resource_name: Option<ResourceName>,
    /// Asset group resource, present once the asset group step completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_group_resource_name: Option<ResourceName>,
    /// Name of the created asset group.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_group_name: Option<String>,
    /// True once the Merchant Center feed was attached.
    pub merchant_center_attached: bool,
    /// Target ROAS carried on the bidding strategy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_roas: Option<f64>,
    /// Start date as requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// End date as requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// Stage that failed, absent on full success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<ProvisioningStage>,
    /// Failure detail, absent on full success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Engine for multi-step campaign provisioning.
pub struct ProvisioningEngine {
    /// Gateway used for the creation writes.
    gateway: Arc<dyn AdsGateway>,
    /// Guardrail limits applied to the requested budget.
    guardrails: GuardrailConfig,
}

impl ProvisioningEngine {
    /// Creates an engine over the given gateway and guardrails.
    #[must_use]
    pub fn new(gateway: Arc<dyn AdsGateway>, guardrails: GuardrailConfig) -> Self {
        Self { gateway, guardrails }
    }

    /// Provisions a campaign with its budget and optional attachments.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] only for pre-execution failures: invalid
    /// inputs or guardrail rejections. Once the first write has been issued,
    /// failures are reported inside the outcome with the resources created
    /// so far.
    pub fn provision(
        &self,
        request: &ProvisioningRequest,
    ) -> Result<ProvisioningOutcome, EngineError> {
        let customer_id = CustomerId::normalize(&request.customer_id);
        let campaign_name = sanitize_name(&request.campaign_name)?;
        let budget_micros = resolve_budget(request)?;
        if budget_micros < MIN_BUDGET_MICROS {
            return Err(EngineError::Validation(format!(
                "budget too low: {budget_micros} micros (minimum: {MIN_BUDGET_MICROS})"
            )));
        }
        self.guardrails.check_budget(OPERATION, budget_micros)?;
        if let Some(roas) = request.target_roas {
            GuardrailConfig::check_roas(OPERATION, roas)?;
        }
        for date in [&request.start_date, &request.end_date].into_iter().flatten() {
            if !is_valid_date(date) {
                return Err(EngineError::Validation(format!(
                    "invalid date: {date} (expected YYYY-MM-DD)"
                )));
            }
        }

        let mut outcome = ProvisioningOutcome {
            success: false,
            campaign_name: campaign_name.clone(),
            status: request.status,
            budget_resource_name: None,
            campaign_resource_name: None,
            asset_group_resource_name: None,
            asset_group_name: None,
            merchant_center_attached: false,
            target_roas: request.target_roas,
            start_date: request.start_date.clone(),
            end_date: request.end_date.clone(),
            failed_stage: None,
            error: None,
        };

        let budget_resource_name = match self.create_budget(&customer_id, &campaign_name, budget_micros)
        {
            Ok(name) => name,
            Err(err) => return Ok(fail(outcome, ProvisioningStage::Budget, &err)),
        };
        outcome.budget_resource_name = Some(budget_resource_name.clone());

        let campaign_resource_name =
            match self.create_campaign(&customer_id, request, &campaign_name, &budget_resource_name) {
                Ok(name) => name,
                Err(err) => return Ok(fail(outcome, ProvisioningStage::Campaign, &err)),
            };
        outcome.campaign_resource_name = Some(campaign_resource_name.clone());

        if let Some(final_url) = &request.final_url {
            let asset_group_name = request
                .asset_group_name
                .clone()
                .unwrap_or_else(|| format!("{campaign_name} Assets"));
            match self.create_asset_group(
                &customer_id,
                &campaign_resource_name,
                &asset_group_name,
                final_url,
            ) {
                Ok(name) => {
                    outcome.asset_group_resource_name = Some(name);
                    outcome.asset_group_name = Some(asset_group_name);
                }
                Err(err) => return Ok(fail(outcome, ProvisioningStage::AssetGroup, &err)),
            }
        }

        if let Some(merchant_center_id) = &request.merchant_center_id {
            if let Err(err) = self.attach_merchant_feed(
                &customer_id,
                &campaign_resource_name,
                merchant_center_id,
                request.feed_label.as_deref(),
            ) {
                return Ok(fail(outcome, ProvisioningStage::FeedAttachment, &err));
            }
            outcome.merchant_center_attached = true;
        }

        outcome.success = true;
        Ok(outcome)
    }

    /// Creates the dedicated, unshared campaign budget.
    fn create_budget(
        &self,
        customer_id: &CustomerId,
        campaign_name: &str,
        amount_micros: i64,
    ) -> Result<ResourceName, EngineError> {
        let operation = json!({
            "create": {
                "name": format!("{campaign_name} Budget"),
                "amountMicros": amount_micros.to_string(),
                "deliveryMethod": "STANDARD",
                "explicitlyShared": false,
            },
        });
        Ok(self.gateway.mutate(customer_id, "campaignBudgets", operation)?)
    }

    /// Creates the campaign with its bidding strategy and schedule.
    fn create_campaign(
        &self,
        customer_id: &CustomerId,
        request: &ProvisioningRequest,
        campaign_name: &str,
        budget_resource_name: &ResourceName,
    ) -> Result<ResourceName, EngineError> {
        // An empty strategy object still selects value maximization.
        let strategy = request
            .target_roas
            .map_or_else(|| json!({}), |roas| json!({ "targetRoas": roas }));
        let mut create = json!({
            "name": campaign_name,
            "status": request.status.as_str(),
            "advertisingChannelType": "PERFORMANCE_MAX",
            "campaignBudget": budget_resource_name.as_str(),
            "maximizeConversionValue": strategy,
        });
        if let Some(start_date) = &request.start_date {
            create["startDate"] = json!(wire_date(start_date));
        }
        if let Some(end_date) = &request.end_date {
            create["endDate"] = json!(wire_date(end_date));
        }
        let operation = json!({ "create": create });
        Ok(self.gateway.mutate(customer_id, "campaigns", operation)?)
    }

    /// Creates an asset group pointing at the landing URL.
    fn create_asset_group(
        &self,
        customer_id: &CustomerId,
        campaign_resource_name: &ResourceName,
        asset_group_name: &str,
        final_url: &str,
    ) -> Result<ResourceName, EngineError> {
        let operation = json!({
            "create": {
                "name": asset_group_name,
                "campaign": campaign_resource_name.as_str(),
                "finalUrls": [final_url],
                "status": "ENABLED",
            },
        });
        Ok(self.gateway.mutate(customer_id, "assetGroups", operation)?)
    }

    /// Attaches a Merchant Center feed via the campaign's shopping setting.
    fn attach_merchant_feed(
        &self,
        customer_id: &CustomerId,
        campaign_resource_name: &ResourceName,
        merchant_center_id: &str,
        feed_label: Option<&str>,
    ) -> Result<(), EngineError> {
        let mut shopping_setting = json!({
            "merchantId": merchant_center_id,
            "enableLocal": true,
        });
        if let Some(label) = feed_label {
            shopping_setting["feedLabel"] = json!(label);
        }
        let operation = json!({
            "update": {
                "resourceName": campaign_resource_name.as_str(),
                "shoppingSetting": shopping_setting,
            },
            "updateMask": "shoppingSetting",
        });
        self.gateway.mutate(customer_id, "campaigns", operation)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Marks the outcome failed at a stage, preserving created resources.
fn fail(
    mut outcome: ProvisioningOutcome,
    stage: ProvisioningStage,
    err: &EngineError,
) -> ProvisioningOutcome {
    outcome.success = false;
    outcome.failed_stage = Some(stage);
    outcome.error = Some(err.to_string());
    outcome
}

/// Validates and trims a campaign name.
fn sanitize_name(raw: &str) -> Result<String, EngineError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation("campaign_name must not be empty".to_string()));
    }
    if trimmed.chars().count() > MAX_NAME_LENGTH {
        return Err(EngineError::Validation(format!(
            "campaign_name exceeds {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(trimmed.to_string())
}

/// Resolves the requested budget to micros, requiring exactly one form.
fn resolve_budget(request: &ProvisioningRequest) -> Result<i64, EngineError> {
    match (request.daily_budget_micros, request.daily_budget_currency) {
        (Some(micros), None) => Ok(micros),
        (None, Some(currency)) => Ok(currency_to_micros(currency)),
        (None, None) => Err(EngineError::Validation(
            "either daily_budget_micros or daily_budget_currency must be provided".to_string(),
        )),
        (Some(_), Some(_)) => Err(EngineError::Validation(
            "daily_budget_micros and daily_budget_currency are mutually exclusive".to_string(),
        )),
    }
}

/// Converts a `YYYY-MM-DD` date to the compact wire form.
fn wire_date(date: &str) -> String {
    date.replace('-', "")
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

    use super::ProvisioningRequest;
    use super::resolve_budget;
    use super::sanitize_name;
    use super::wire_date;
    use crate::runtime::EngineError;
    use crate::runtime::status::TargetStatus;

    fn request() -> ProvisioningRequest {
        ProvisioningRequest {
            customer_id: "1234567890".to_string(),
            campaign_name: "Spring Sale".to_string(),
            daily_budget_micros: Some(50_000_000),
            daily_budget_currency: None,
            target_roas: None,
            merchant_center_id: None,
            feed_label: None,
            start_date: None,
            end_date: None,
            status: TargetStatus::Paused,
            final_url: None,
            asset_group_name: None,
        }
    }

    #[test]
    fn names_are_trimmed_and_bounded() {
        assert_eq!(sanitize_name("  Spring Sale  ").unwrap(), "Spring Sale");
        assert!(sanitize_name("   ").is_err());
        assert!(sanitize_name(&"x".repeat(256)).is_err());
        assert!(sanitize_name(&"x".repeat(255)).is_ok());
    }

    #[test]
    fn budget_forms_are_mutually_exclusive() {
        assert_eq!(resolve_budget(&request()).unwrap(), 50_000_000);

        let mut currency_only = request();
        currency_only.daily_budget_micros = None;
        currency_only.daily_budget_currency = Some(50.0);
        assert_eq!(resolve_budget(&currency_only).unwrap(), 50_000_000);

        let mut neither = request();
        neither.daily_budget_micros = None;
        assert!(matches!(resolve_budget(&neither), Err(EngineError::Validation(_))));

        let mut both = request();
        both.daily_budget_currency = Some(50.0);
        assert!(matches!(resolve_budget(&both), Err(EngineError::Validation(_))));
    }

    #[test]
    fn wire_dates_drop_separators() {
        assert_eq!(wire_date("2026-09-01"), "20260901");
    }
}
