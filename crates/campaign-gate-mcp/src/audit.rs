// campaign-gate-mcp/src/audit.rs
// ============================================================================
// Module: Mutation Audit Logging
// Description: Structured audit events for tool invocations.
// Purpose: Emit masked audit logs without hard dependencies.
// Dependencies: campaign-gate-core, serde
// ============================================================================

//! ## Overview
//! This module defines audit event payloads and sinks for tool invocations.
//! Events are JSON lines; sensitive request values are masked before they
//! reach any sink, so deployments can route the stream to their preferred
//! logging pipeline without redaction work of their own.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use campaign_gate_core::mask_account_id;
use campaign_gate_core::mask_free_text;
use serde::Serialize;

use crate::config::ServerTransport;
use crate::tools::ToolName;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome classification for a tool invocation.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ToolOutcome {
    /// The tool executed and returned a result.
    Ok,
    /// The tool was intercepted by dry-run mode.
    DryRun,
    /// The tool failed.
    Error,
}

/// Tool invocation audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct ToolAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Request identifier when provided.
    pub request_id: Option<String>,
    /// Transport used for the request.
    pub transport: ServerTransport,
    /// Tool name.
    pub tool: ToolName,
    /// Masked customer identifier the call targeted, when present.
    pub customer_id: Option<String>,
    /// Invocation outcome.
    pub outcome: ToolOutcome,
    /// Number of items the call affected, when known.
    pub affected_count: Option<usize>,
    /// Error summary for failed invocations.
    pub error: Option<String>,
}

/// Constructor parameters for [`ToolAuditEvent`].
#[derive(Debug)]
pub struct ToolAuditEventParams {
    /// Request identifier when provided.
    pub request_id: Option<String>,
    /// Transport used for the request.
    pub transport: ServerTransport,
    /// Tool name.
    pub tool: ToolName,
    /// Raw customer identifier the call targeted, when present.
    pub customer_id: Option<String>,
    /// Invocation outcome.
    pub outcome: ToolOutcome,
    /// Number of items the call affected, when known.
    pub affected_count: Option<usize>,
    /// Error summary for failed invocations.
    pub error: Option<String>,
}

impl ToolAuditEvent {
    /// Builds a tool invocation event, masking the customer identifier and
    /// any credential- or id-shaped substrings in the error summary.
    #[must_use]
    pub fn new(params: ToolAuditEventParams) -> Self {
        let timestamp_ms =
            SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis();
        Self {
            event: "tool_call",
            timestamp_ms,
            request_id: params.request_id,
            transport: params.transport,
            tool: params.tool,
            customer_id: params.customer_id.as_deref().map(mask_account_id),
            outcome: params.outcome,
            affected_count: params.affected_count,
            error: params.error.as_deref().map(mask_free_text),
        }
    }
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for tool invocation events.
pub trait MutationAuditSink: Send + Sync {
    /// Records a tool invocation event.
    fn record(&self, event: &ToolAuditEvent);
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrMutationAuditSink;

impl MutationAuditSink for StderrMutationAuditSink {
    fn record(&self, event: &ToolAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(std::io::stderr(), "{payload}");
        }
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileMutationAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileMutationAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl MutationAuditSink for FileMutationAuditSink {
    fn record(&self, event: &ToolAuditEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// No-op audit sink.
pub struct NoopMutationAuditSink;

impl MutationAuditSink for NoopMutationAuditSink {
    fn record(&self, _event: &ToolAuditEvent) {}
}

// ============================================================================
// SECTION: Tests
// ============================================================================
