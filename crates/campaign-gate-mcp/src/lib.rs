// campaign-gate-mcp/src/lib.rs
// ============================================================================
// Module: Campaign Gate MCP
// Description: MCP server exposing guarded Google Ads mutation tools.
// Purpose: Provide MCP tool adapters over the Campaign Gate engines.
// Dependencies: campaign-gate-api, campaign-gate-core, axum, tokio
// ============================================================================

//! ## Overview
//! Campaign Gate MCP exposes the mutation engines through MCP tools. All
//! tools pass through the guardrail layer before any remote call: dry-run
//! interception, budget and bulk ceilings, confirmation requirements, and
//! sensitive-value masking for the audit stream.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod auth;
pub mod config;
pub mod server;
pub mod tools;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::FileMutationAuditSink;
pub use audit::MutationAuditSink;
pub use audit::NoopMutationAuditSink;
pub use audit::StderrMutationAuditSink;
pub use audit::ToolAuditEvent;
pub use audit::ToolOutcome;
pub use auth::AuthAuditSink;
pub use auth::AuthContext;
pub use auth::DefaultToolAuthz;
pub use auth::NoopAuthAuditSink;
pub use auth::RequestContext;
pub use auth::StderrAuthAuditSink;
pub use auth::ToolAuthz;
pub use config::CampaignGateConfig;
pub use config::ConfigError;
pub use config::ServerAuthMode;
pub use config::ServerTransport;
pub use server::McpServer;
pub use server::McpServerError;
pub use tools::ToolDefinition;
pub use tools::ToolError;
pub use tools::ToolName;
pub use tools::ToolRouter;
pub use tools::tool_definitions;
