// campaign-gate-mcp/src/tools.rs
// ============================================================================
// Module: MCP Tool Router
// Description: Tool routing for the Campaign Gate MCP server.
// Purpose: Expose the mutation engines as guarded MCP tools.
// Dependencies: campaign-gate-core, serde
// ============================================================================

//! ## Overview
//! The tool router dispatches MCP tool calls to the mutation engines. Every
//! mutating tool passes through the guardrail layer before any network call:
//! dry-run mode short-circuits with a masked report of what would happen, and
//! limit violations surface before a single write is attempted. Tool inputs
//! are untrusted and decoded strictly.
//!
//! ## Invariants
//! - Dry-run interception issues zero network calls.
//! - Authorization failures are audited and fail closed.
//! - Responses serialize the engine result records unchanged.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use campaign_gate_core::AdsGateway;
use campaign_gate_core::BiddingEngine;
use campaign_gate_core::BiddingUpdateRequest;
use campaign_gate_core::BudgetAdjustment;
use campaign_gate_core::BudgetEngine;
use campaign_gate_core::BudgetUpdateRequest;
use campaign_gate_core::EngineError;
use campaign_gate_core::GuardrailConfig;
use campaign_gate_core::MutationIntent;
use campaign_gate_core::ProvisioningEngine;
use campaign_gate_core::ProvisioningRequest;
use campaign_gate_core::StatusChangeRequest;
use campaign_gate_core::StatusEngine;
use campaign_gate_core::currency_to_micros;
use campaign_gate_core::micros_to_currency;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;

use crate::audit::MutationAuditSink;
use crate::audit::ToolAuditEvent;
use crate::audit::ToolAuditEventParams;
use crate::audit::ToolOutcome;
use crate::auth::AuthAction;
use crate::auth::AuthAuditEvent;
use crate::auth::AuthAuditSink;
use crate::auth::AuthContext;
use crate::auth::AuthError;
use crate::auth::RequestContext;
use crate::auth::ToolAuthz;

// ============================================================================
// SECTION: Tool Names
// ============================================================================

/// Canonical tool names for Campaign Gate MCP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    /// Adjust one campaign's daily budget.
    BudgetUpdate,
    /// Set the target ROAS on one campaign's bidding strategy.
    BiddingSetTargetRoas,
    /// Pause one or more campaigns.
    CampaignsPause,
    /// Enable one or more campaigns, with budget safety checks.
    CampaignsEnable,
    /// Provision a Performance Max campaign end to end.
    CampaignCreate,
    /// Report the effective guardrail configuration.
    GuardrailsGet,
}

impl ToolName {
    /// Returns the canonical string name for the tool.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BudgetUpdate => "budget_update",
            Self::BiddingSetTargetRoas => "bidding_set_target_roas",
            Self::CampaignsPause => "campaigns_pause",
            Self::CampaignsEnable => "campaigns_enable",
            Self::CampaignCreate => "campaign_create",
            Self::GuardrailsGet => "guardrails_get",
        }
    }

    /// Returns all Campaign Gate tool names in canonical order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::BudgetUpdate,
            Self::BiddingSetTargetRoas,
            Self::CampaignsPause,
            Self::CampaignsEnable,
            Self::CampaignCreate,
            Self::GuardrailsGet,
        ]
    }

    /// Parses a tool name from its string representation.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "budget_update" => Some(Self::BudgetUpdate),
            "bidding_set_target_roas" => Some(Self::BiddingSetTargetRoas),
            "campaigns_pause" => Some(Self::CampaignsPause),
            "campaigns_enable" => Some(Self::CampaignsEnable),
            "campaign_create" => Some(Self::CampaignCreate),
            "guardrails_get" => Some(Self::GuardrailsGet),
            _ => None,
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Tool Definitions
// ============================================================================

/// Tool definition advertised to MCP clients.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    /// MCP tool name.
    pub name: ToolName,
    /// Tool description for clients.
    pub description: String,
    /// JSON schema for tool input.
    pub input_schema: Value,
}

/// Returns the definitions for every Campaign Gate tool.
#[must_use]
pub fn tool_definitions() -> Vec<ToolDefinition> {
    let campaign_selection = json!({
        "customer_id": { "type": "string", "description": "Account identifier in any accepted format." },
        "campaign_id": { "type": "string" },
        "campaign_resource_name": { "type": "string" }
    });
    let bulk_selection = json!({
        "customer_id": { "type": "string", "description": "Account identifier in any accepted format." },
        "campaign_id": { "type": "string" },
        "campaign_ids": { "type": "array", "items": { "type": "string" } },
        "campaign_resource_name": { "type": "string" },
        "name_pattern": { "type": "string", "description": "Campaign name pattern with * wildcards." },
        "confirm": { "type": "boolean", "default": false }
    });
    vec![
        ToolDefinition {
            name: ToolName::BudgetUpdate,
            description: "Adjust one campaign's daily budget by absolute amount or percentage."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "customer_id": campaign_selection["customer_id"],
                    "campaign_id": campaign_selection["campaign_id"],
                    "campaign_resource_name": campaign_selection["campaign_resource_name"],
                    "adjustment_type": {
                        "type": "string",
                        "enum": [
                            "SET",
                            "INCREASE_BY_PERCENT",
                            "DECREASE_BY_PERCENT",
                            "INCREASE_BY_AMOUNT",
                            "DECREASE_BY_AMOUNT"
                        ]
                    },
                    "amount_micros": { "type": "integer" },
                    "percent": { "type": "number" }
                },
                "required": ["customer_id", "adjustment_type"]
            }),
        },
        ToolDefinition {
            name: ToolName::BiddingSetTargetRoas,
            description: "Set the target ROAS on a campaign's Maximize Conversion Value strategy."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "customer_id": campaign_selection["customer_id"],
                    "campaign_id": campaign_selection["campaign_id"],
                    "campaign_resource_name": campaign_selection["campaign_resource_name"],
                    "target_roas": { "type": "number", "minimum": 0.01, "maximum": 100.0 },
                    "cpc_bid_ceiling_micros": { "type": "integer" },
                    "cpc_bid_floor_micros": { "type": "integer" }
                },
                "required": ["customer_id", "target_roas"]
            }),
        },
        ToolDefinition {
            name: ToolName::CampaignsPause,
            description: "Pause one or more campaigns, selected by id, list, resource name, or \
                          name pattern."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": bulk_selection,
                "required": ["customer_id"]
            }),
        },
        ToolDefinition {
            name: ToolName::CampaignsEnable,
            description: "Enable one or more campaigns; campaigns without a funded budget are \
                          refused unless safety checks are disabled."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "customer_id": bulk_selection["customer_id"],
                    "campaign_id": bulk_selection["campaign_id"],
                    "campaign_ids": bulk_selection["campaign_ids"],
                    "campaign_resource_name": bulk_selection["campaign_resource_name"],
                    "name_pattern": bulk_selection["name_pattern"],
                    "confirm": bulk_selection["confirm"],
                    "safety_check": { "type": "boolean", "default": true }
                },
                "required": ["customer_id"]
            }),
        },
        ToolDefinition {
            name: ToolName::CampaignCreate,
            description: "Provision a Performance Max campaign: budget, campaign, asset group, \
                          and optional Merchant Center feed attachment."
                .to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "customer_id": campaign_selection["customer_id"],
                    "campaign_name": { "type": "string", "maxLength": 255 },
                    "daily_budget_micros": { "type": "integer" },
                    "daily_budget_currency": { "type": "number" },
                    "target_roas": { "type": "number" },
                    "merchant_center_id": { "type": "string" },
                    "feed_label": { "type": "string" },
                    "start_date": { "type": "string", "description": "YYYY-MM-DD" },
                    "end_date": { "type": "string", "description": "YYYY-MM-DD" },
                    "status": { "type": "string", "enum": ["PAUSED", "ENABLED"] },
                    "final_url": { "type": "string" },
                    "asset_group_name": { "type": "string" }
                },
                "required": ["customer_id", "campaign_name"]
            }),
        },
        ToolDefinition {
            name: ToolName::GuardrailsGet,
            description: "Report the effective guardrail configuration.".to_string(),
            input_schema: json!({ "type": "object", "properties": {} }),
        },
    ]
}

// ============================================================================
// SECTION: Tool Router
// ============================================================================

/// Tool router for MCP requests.
pub struct ToolRouter {
    /// Budget adjustment engine.
    budget: BudgetEngine,
    /// Target-ROAS bidding engine.
    bidding: BiddingEngine,
    /// Bulk status-change engine.
    status: StatusEngine,
    /// Performance Max provisioning engine.
    provisioning: ProvisioningEngine,
    /// Guardrail policy consulted for dry-run and reporting.
    guardrails: GuardrailConfig,
    /// Authn/authz policy for tool calls.
    authz: Arc<dyn ToolAuthz>,
    /// Audit sink for auth decisions.
    auth_audit: Arc<dyn AuthAuditSink>,
    /// Audit sink for tool invocations.
    audit: Arc<dyn MutationAuditSink>,
}

impl ToolRouter {
    /// Builds a router over the shared gateway and policies.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn AdsGateway>,
        guardrails: GuardrailConfig,
        authz: Arc<dyn ToolAuthz>,
        auth_audit: Arc<dyn AuthAuditSink>,
        audit: Arc<dyn MutationAuditSink>,
    ) -> Self {
        Self {
            budget: BudgetEngine::new(Arc::clone(&gateway), guardrails.clone()),
            bidding: BiddingEngine::new(Arc::clone(&gateway)),
            status: StatusEngine::new(Arc::clone(&gateway), guardrails.clone()),
            provisioning: ProvisioningEngine::new(gateway, guardrails.clone()),
            guardrails,
            authz,
            auth_audit,
            audit,
        }
    }

    /// Lists the tool definitions the caller is allowed to see.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] when authorization fails.
    pub fn list_tools(&self, context: &RequestContext) -> Result<Vec<ToolDefinition>, ToolError> {
        let _ = self.authorize(context, AuthAction::ListTools)?;
        Ok(tool_definitions())
    }

    /// Handles a tool call by name with JSON payload.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] when routing fails.
    pub fn handle_tool_call(
        &self,
        context: &RequestContext,
        name: &str,
        arguments: Value,
    ) -> Result<Value, ToolError> {
        let tool = ToolName::parse(name).ok_or(ToolError::UnknownTool)?;
        let _ = self.authorize(context, AuthAction::CallTool(tool))?;
        match tool {
            ToolName::BudgetUpdate => self.handle_budget_update(context, arguments),
            ToolName::BiddingSetTargetRoas => self.handle_bidding_update(context, arguments),
            ToolName::CampaignsPause => self.handle_status_change(context, tool, arguments),
            ToolName::CampaignsEnable => self.handle_status_change(context, tool, arguments),
            ToolName::CampaignCreate => self.handle_campaign_create(context, arguments),
            ToolName::GuardrailsGet => Ok(self.guardrail_report()),
        }
    }

    /// Handles budget adjustment calls.
    fn handle_budget_update(
        &self,
        context: &RequestContext,
        arguments: Value,
    ) -> Result<Value, ToolError> {
        let request: BudgetUpdateRequest = decode(arguments.clone())?;
        let intent = MutationIntent {
            // Percentage adjustments depend on the current amount, which a
            // dry run must not fetch; only absolute targets are checked.
            budget_micros: match request.adjustment {
                BudgetAdjustment::Set {
                    amount_micros,
                }
                | BudgetAdjustment::IncreaseByAmount {
                    amount_micros,
                } => Some(amount_micros),
                _ => None,
            },
            target_roas: None,
            affected_count: 1,
            confirm: false,
        };
        if self.guardrails.dry_run {
            return self.dry_run(context, ToolName::BudgetUpdate, &arguments, &intent, &request.customer_id);
        }
        let result = self.budget.update(&request);
        self.record_outcome(context, ToolName::BudgetUpdate, &request.customer_id, 1, &result);
        let update = result?;
        serde_json::to_value(update).map_err(|_| ToolError::Serialization)
    }

    /// Handles target-ROAS calls.
    fn handle_bidding_update(
        &self,
        context: &RequestContext,
        arguments: Value,
    ) -> Result<Value, ToolError> {
        let request: BiddingUpdateRequest = decode(arguments.clone())?;
        let intent = MutationIntent {
            budget_micros: None,
            target_roas: Some(request.target_roas),
            affected_count: 1,
            confirm: false,
        };
        if self.guardrails.dry_run {
            return self.dry_run(
                context,
                ToolName::BiddingSetTargetRoas,
                &arguments,
                &intent,
                &request.customer_id,
            );
        }
        let result = self.bidding.set_target_roas(&request);
        self.record_outcome(
            context,
            ToolName::BiddingSetTargetRoas,
            &request.customer_id,
            1,
            &result,
        );
        let update = result?;
        serde_json::to_value(update).map_err(|_| ToolError::Serialization)
    }

    /// Handles pause and enable calls.
    fn handle_status_change(
        &self,
        context: &RequestContext,
        tool: ToolName,
        arguments: Value,
    ) -> Result<Value, ToolError> {
        let request: StatusChangeRequest = decode(arguments.clone())?;
        // Pattern selections are resolved remotely, so a dry run reports
        // them as a single selection rather than querying for matches.
        let affected = request.campaign_ids.as_ref().map_or(1, Vec::len);
        let intent = MutationIntent {
            budget_micros: None,
            target_roas: None,
            affected_count: affected,
            confirm: request.confirm,
        };
        if self.guardrails.dry_run {
            return self.dry_run(context, tool, &arguments, &intent, &request.customer_id);
        }
        let result = match tool {
            ToolName::CampaignsEnable => self.status.enable(&request),
            _ => self.status.pause(&request),
        };
        let affected = result.as_ref().map_or(affected, |outcome| {
            outcome.updated_count + outcome.failed_count
        });
        self.record_outcome(context, tool, &request.customer_id, affected, &result);
        let outcome = result?;
        serde_json::to_value(outcome).map_err(|_| ToolError::Serialization)
    }

    /// Handles Performance Max provisioning calls.
    fn handle_campaign_create(
        &self,
        context: &RequestContext,
        arguments: Value,
    ) -> Result<Value, ToolError> {
        let request: ProvisioningRequest = decode(arguments.clone())?;
        let budget_micros = request
            .daily_budget_micros
            .or_else(|| request.daily_budget_currency.map(currency_to_micros));
        let intent = MutationIntent {
            budget_micros,
            target_roas: request.target_roas,
            affected_count: 1,
            confirm: false,
        };
        if self.guardrails.dry_run {
            return self.dry_run(
                context,
                ToolName::CampaignCreate,
                &arguments,
                &intent,
                &request.customer_id,
            );
        }
        let result = self.provisioning.provision(&request);
        self.record_outcome(context, ToolName::CampaignCreate, &request.customer_id, 1, &result);
        let outcome = result?;
        serde_json::to_value(outcome).map_err(|_| ToolError::Serialization)
    }

    /// Builds the guardrail configuration report.
    fn guardrail_report(&self) -> Value {
        json!({
            "dry_run_enabled": self.guardrails.dry_run,
            "require_confirmation": self.guardrails.require_confirmation,
            "max_budget_micros": self.guardrails.max_budget_micros,
            "max_budget_currency": micros_to_currency(self.guardrails.max_budget_micros),
            "max_campaigns_bulk": self.guardrails.max_bulk_count,
        })
    }

    /// Emits the dry-run report without touching the network.
    fn dry_run(
        &self,
        context: &RequestContext,
        tool: ToolName,
        arguments: &Value,
        intent: &MutationIntent,
        customer_id: &str,
    ) -> Result<Value, ToolError> {
        let report = self.guardrails.dry_run_report(tool.as_str(), arguments, intent);
        self.audit.record(&ToolAuditEvent::new(ToolAuditEventParams {
            request_id: context.request_id.clone(),
            transport: context.transport,
            tool,
            customer_id: Some(customer_id.to_string()),
            outcome: ToolOutcome::DryRun,
            affected_count: Some(intent.affected_count),
            error: None,
        }));
        serde_json::to_value(report).map_err(|_| ToolError::Serialization)
    }

    /// Records the audit event for a live engine invocation.
    fn record_outcome<T>(
        &self,
        context: &RequestContext,
        tool: ToolName,
        customer_id: &str,
        affected: usize,
        result: &Result<T, EngineError>,
    ) {
        let (outcome, error) = match result {
            Ok(_) => (ToolOutcome::Ok, None),
            Err(err) => (ToolOutcome::Error, Some(err.to_string())),
        };
        self.audit.record(&ToolAuditEvent::new(ToolAuditEventParams {
            request_id: context.request_id.clone(),
            transport: context.transport,
            tool,
            customer_id: Some(customer_id.to_string()),
            outcome,
            affected_count: Some(affected),
            error,
        }));
    }

    /// Authorizes a request and audits the decision.
    fn authorize(
        &self,
        context: &RequestContext,
        action: AuthAction,
    ) -> Result<AuthContext, ToolError> {
        match self.authz.authorize(context, action) {
            Ok(auth_ctx) => {
                self.auth_audit.record(&AuthAuditEvent::allowed(context, action, &auth_ctx));
                Ok(auth_ctx)
            }
            Err(err) => {
                self.auth_audit.record(&AuthAuditEvent::denied(context, action, &err));
                Err(err.into())
            }
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Tool routing errors.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Tool name not recognized.
    #[error("unknown tool")]
    UnknownTool,
    /// Missing or invalid authentication.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    /// Authenticated caller not authorized to access tool.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Tool payload deserialization failed.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    /// Guardrail policy rejected the operation before execution.
    #[error("guardrail violation: {0}")]
    Guardrail(String),
    /// Referenced remote resource is absent.
    #[error("not found: {0}")]
    NotFound(String),
    /// Remote platform rejected the request.
    #[error("remote error (status {status}): {body}")]
    Remote {
        /// HTTP status code, zero for transport-level failures.
        status: u16,
        /// Raw response body, truncated upstream.
        body: String,
    },
    /// Tool payload serialization failed.
    #[error("serialization failure")]
    Serialization,
}

impl From<AuthError> for ToolError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Unauthenticated(message) => Self::Unauthenticated(message),
            AuthError::Unauthorized(message) => Self::Unauthorized(message),
        }
    }
}

impl From<EngineError> for ToolError {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::Validation(message) => Self::InvalidParams(message),
            EngineError::Guardrail(violation) => Self::Guardrail(violation.to_string()),
            EngineError::NotFound(message) => Self::NotFound(message),
            EngineError::Remote {
                status,
                body,
            } => Self::Remote {
                status,
                body,
            },
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Decodes a tool payload, rejecting malformed input.
fn decode<T: for<'de> Deserialize<'de>>(payload: Value) -> Result<T, ToolError> {
    serde_json::from_value(payload).map_err(|err| ToolError::InvalidParams(err.to_string()))
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
        clippy::missing_docs_in_private_items,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use super::*;

    #[test]
    fn tool_names_round_trip() {
        for tool in ToolName::all() {
            assert_eq!(ToolName::parse(tool.as_str()), Some(*tool));
        }
        assert_eq!(ToolName::parse("no_such_tool"), None);
    }

    #[test]
    fn definitions_cover_every_tool() {
        let definitions = tool_definitions();
        assert_eq!(definitions.len(), ToolName::all().len());
        for (definition, tool) in definitions.iter().zip(ToolName::all()) {
            assert_eq!(definition.name, *tool);
            assert_eq!(definition.input_schema["type"], "object");
        }
    }

    #[test]
    fn engine_errors_map_to_tool_errors() {
        let error: ToolError = EngineError::Validation("bad".to_string()).into();
        assert!(matches!(error, ToolError::InvalidParams(_)));
        let error: ToolError = EngineError::NotFound("gone".to_string()).into();
        assert!(matches!(error, ToolError::NotFound(_)));
        let error: ToolError = EngineError::Remote {
            status: 400,
            body: "bad request".to_string(),
        }
        .into();
        assert!(matches!(
            error,
            ToolError::Remote {
                status: 400,
                ..
            }
        ));
    }
}
