// campaign-gate-core/tests/common/mod.rs
// ============================================================================
// Module: Common Test Fixtures
// Description: Shared test doubles for engine tests.
// Purpose: Provide a scripted gateway that records every call.
// Dependencies: campaign-gate-core, serde_json
// ============================================================================

//! ## Overview
//! The scripted gateway replays queued responses and records every search
//! and mutation it receives, so engine tests can assert both the results
//! and the exact wire payloads, including that guardrail rejections issue
//! no calls at all.

#![allow(dead_code, reason = "Shared test helpers may be unused in some cases.")]
#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "Test-only panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::VecDeque;
use std::sync::Mutex;

use campaign_gate_core::AdsGateway;
use campaign_gate_core::CustomerId;
use campaign_gate_core::GatewayError;
use campaign_gate_core::ResourceName;
use serde_json::Value;

// ============================================================================
// SECTION: Recorded Calls
// ============================================================================

/// One call observed by the scripted gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCall {
    /// A row query.
    Search {
        /// Normalized account identifier.
        customer_id: String,
        /// Query text as sent.
        query: String,
    },
    /// A single-operation mutation.
    Mutate {
        /// Normalized account identifier.
        customer_id: String,
        /// Resource collection addressed.
        collection: String,
        /// Operation payload as sent.
        operation: Value,
    },
}

// ============================================================================
// SECTION: Scripted Gateway
// ============================================================================

/// Gateway double replaying queued responses.
#[derive(Default)]
pub struct ScriptedGateway {
    /// Queued responses for `search`, consumed front to back.
    search_responses: Mutex<VecDeque<Result<Vec<Value>, GatewayError>>>,
    /// Queued responses for `mutate`, consumed front to back.
    mutate_responses: Mutex<VecDeque<Result<ResourceName, GatewayError>>>,
    /// Every call received, in order.
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGateway {
    /// Creates an empty gateway; any call without a queued response panics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful search response.
    pub fn push_search(&self, rows: Vec<Value>) {
        self.search_responses.lock().unwrap().push_back(Ok(rows));
    }

    /// Queues a failing search response.
    pub fn push_search_err(&self, err: GatewayError) {
        self.search_responses.lock().unwrap().push_back(Err(err));
    }

    /// Queues a successful mutation response.
    pub fn push_mutate(&self, resource_name: &str) {
        self.mutate_responses
            .lock()
            .unwrap()
            .push_back(Ok(ResourceName::from_raw(resource_name)));
    }

    /// Queues a failing mutation response.
    pub fn push_mutate_err(&self, err: GatewayError) {
        self.mutate_responses.lock().unwrap().push_back(Err(err));
    }

    /// Snapshot of every call received so far.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Operations received by `mutate`, in order.
    pub fn mutations(&self) -> Vec<Value> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                RecordedCall::Mutate { operation, .. } => Some(operation),
                RecordedCall::Search { .. } => None,
            })
            .collect()
    }
}

impl AdsGateway for ScriptedGateway {
    fn search(&self, customer_id: &CustomerId, query: &str) -> Result<Vec<Value>, GatewayError> {
        self.calls.lock().unwrap().push(RecordedCall::Search {
            customer_id: customer_id.as_str().to_string(),
            query: query.to_string(),
        });
        self.search_responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected search call")
    }

    fn mutate(
        &self,
        customer_id: &CustomerId,
        collection: &str,
        operation: Value,
    ) -> Result<ResourceName, GatewayError> {
        self.calls.lock().unwrap().push(RecordedCall::Mutate {
            customer_id: customer_id.as_str().to_string(),
            collection: collection.to_string(),
            operation,
        });
        self.mutate_responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("unexpected mutate call")
    }
}

// ============================================================================
// SECTION: Row Builders
// ============================================================================

/// Builds a search row carrying a campaign and its budget.
pub fn campaign_budget_row(
    campaign_id: &str,
    campaign_name: &str,
    budget_resource_name: &str,
    amount_micros: i64,
) -> Value {
    serde_json::json!({
        "campaign": {
            "id": campaign_id,
            "name": campaign_name,
            "campaignBudget": budget_resource_name,
        },
        "campaignBudget": {
            "amountMicros": amount_micros.to_string(),
        },
    })
}
