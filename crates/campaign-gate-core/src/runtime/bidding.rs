// campaign-gate-core/src/runtime/bidding.rs
// ============================================================================
// Module: Bidding Engine
// Description: Target-ROAS management for value-maximizing campaigns.
// Purpose: Read current bidding state and write new target ROAS values.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Sets or updates the target ROAS on a campaign's value-maximizing bidding
//! strategy, optionally constraining CPC bids with ceiling and floor limits.
//! The requested ROAS is bounds-checked before any network call; the result
//! reports the previous value so the caller can see the delta.

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
use crate::interfaces::AdsGateway;
use crate::runtime::EngineError;
use crate::runtime::resolve_campaign;
use crate::runtime::row_f64;
use crate::runtime::row_str;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Operation label used in guardrail messages.
const OPERATION: &str = "bidding_set_target_roas";

// ============================================================================
// SECTION: Request and Result
// ============================================================================

/// Request to set the target ROAS on one campaign.
#[derive(Debug, Clone, Deserialize)]
pub struct BiddingUpdateRequest {
    /// Account owning the campaign, in any accepted identifier format.
    pub customer_id: String,
    /// Campaign identifier, when not addressing by resource name.
    #[serde(default)]
    pub campaign_id: Option<String>,
    /// Full campaign resource name, when known.
    #[serde(default)]
    pub campaign_resource_name: Option<String>,
    /// Target ROAS to write, e.g. `2.5` for 250%.
    pub target_roas: f64,
    /// Optional maximum CPC bid in micros.
    #[serde(default)]
    pub cpc_bid_ceiling_micros: Option<i64>,
    /// Optional minimum CPC bid in micros.
    #[serde(default)]
    pub cpc_bid_floor_micros: Option<i64>,
}

/// Result of a completed target-ROAS update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BiddingUpdate {
    /// Campaign that was written.
    pub campaign_resource_name: ResourceName,
    /// Campaign display name.
    pub campaign_name: String,
    /// Target ROAS before the write, absent when none was set.
    pub previous_target_roas: Option<f64>,
    /// Target ROAS after the write.
    pub new_target_roas: f64,
    /// Signed delta, absent when no previous value existed.
    pub target_roas_change: Option<f64>,
    /// CPC ceiling that was written, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpc_bid_ceiling_micros: Option<i64>,
    /// CPC floor that was written, when requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpc_bid_floor_micros: Option<i64>,
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// Engine for target-ROAS updates.
pub struct BiddingEngine {
    /// Gateway used for reads and writes.
    gateway: Arc<dyn AdsGateway>,
}

impl BiddingEngine {
    /// Creates an engine over the given gateway.
    #[must_use]
    pub fn new(gateway: Arc<dyn AdsGateway>) -> Self {
        Self { gateway }
    }

    /// Sets the target ROAS on a campaign and reports the previous value.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] when the ROAS is out of bounds, the campaign
    /// does not exist, or the remote write fails.
    pub fn set_target_roas(
        &self,
        request: &BiddingUpdateRequest,
    ) -> Result<BiddingUpdate, EngineError> {
        GuardrailConfig::check_roas(OPERATION, request.target_roas)?;

        let customer_id = CustomerId::normalize(&request.customer_id);
        let campaign_resource_name = resolve_campaign(
            &customer_id,
            request.campaign_id.as_deref(),
            request.campaign_resource_name.as_deref(),
        )?;

        let query = format!(
            "SELECT campaign.id, campaign.name, \
             campaign.maximize_conversion_value.target_roas, \
             campaign.maximize_conversion_value.cpc_bid_ceiling_micros, \
             campaign.maximize_conversion_value.cpc_bid_floor_micros \
             FROM campaign WHERE campaign.resource_name = '{}'",
            campaign_resource_name.as_str()
        );
        let rows = self.gateway.search(&customer_id, &query)?;
        let row = rows.first().ok_or_else(|| {
            EngineError::NotFound(format!("campaign not found: {}", campaign_resource_name.as_str()))
        })?;

        let campaign_name =
            row_str(row, &["campaign", "name"]).unwrap_or_default().to_string();
        let previous_target_roas =
            row_f64(row, &["campaign", "maximizeConversionValue", "targetRoas"]);

        let mut strategy = json!({ "targetRoas": request.target_roas });
        if let Some(ceiling) = request.cpc_bid_ceiling_micros {
            strategy["cpcBidCeilingMicros"] = json!(ceiling.to_string());
        }
        if let Some(floor) = request.cpc_bid_floor_micros {
            strategy["cpcBidFloorMicros"] = json!(floor.to_string());
        }
        let operation = json!({
            "update": {
                "resourceName": campaign_resource_name.as_str(),
                "maximizeConversionValue": strategy,
            },
            "updateMask": "maximizeConversionValue",
        });
        self.gateway.mutate(&customer_id, "campaigns", operation)?;

        Ok(BiddingUpdate {
            campaign_resource_name,
            campaign_name,
            previous_target_roas,
            new_target_roas: request.target_roas,
            target_roas_change: previous_target_roas.map(|previous| request.target_roas - previous),
            cpc_bid_ceiling_micros: request.cpc_bid_ceiling_micros,
            cpc_bid_floor_micros: request.cpc_bid_floor_micros,
        })
    }
}
