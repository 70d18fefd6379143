// campaign-gate-core/tests/status_engine.rs
// ============================================================================
// Module: Status Engine Tests
// Description: Engine-level tests for bulk pause and enable flows.
// Purpose: Verify selection, guardrails, safety checks, and partitioning.
// Dependencies: campaign-gate-core, serde_json
// ============================================================================

//! ## Overview
//! Exercises the status engine against a scripted gateway: selection
//! resolution including name patterns, the pattern-confirmation gate that
//! runs before any lookup, bulk-size and confirmation guardrails applied
//! after resolution, the enable-time budget safety check, and per-item
//! partitioning of remote failures.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    reason = "Test-only panic-based assertions are permitted."
)]

mod common;

use std::sync::Arc;

use campaign_gate_core::AdsGateway;
use campaign_gate_core::EngineError;
use campaign_gate_core::GuardrailConfig;
use campaign_gate_core::StatusChangeRequest;
use campaign_gate_core::StatusEngine;
use campaign_gate_core::TargetStatus;
use common::RecordedCall;
use common::ScriptedGateway;
use common::campaign_budget_row;
use serde_json::json;

fn request() -> StatusChangeRequest {
    StatusChangeRequest {
        customer_id: "123-456-7890".to_string(),
        campaign_id: None,
        campaign_ids: None,
        campaign_resource_name: None,
        name_pattern: None,
        confirm: false,
        safety_check: true,
    }
}

fn engine(gateway: &Arc<ScriptedGateway>) -> StatusEngine {
    let shared: Arc<dyn AdsGateway> = Arc::<ScriptedGateway>::clone(gateway);
    StatusEngine::new(shared, GuardrailConfig::default())
}

#[test]
fn pausing_one_campaign_needs_no_confirmation() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_mutate("customers/1234567890/campaigns/42");

    let mut single = request();
    single.campaign_id = Some("42".to_string());
    let outcome = engine(&gateway).pause(&single).unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.updated_count, 1);
    assert_eq!(outcome.succeeded[0].previous_status, "UNKNOWN");
    assert_eq!(outcome.succeeded[0].new_status, TargetStatus::Paused);

    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    let RecordedCall::Mutate { collection, operation, .. } = &calls[0] else {
        panic!("expected a mutation");
    };
    assert_eq!(collection, "campaigns");
    assert_eq!(
        *operation,
        json!({
            "update": {
                "resourceName": "customers/1234567890/campaigns/42",
                "status": "PAUSED",
            },
            "updateMask": "status",
        })
    );
}

#[test]
fn bulk_pause_requires_confirmation() {
    let gateway = Arc::new(ScriptedGateway::new());

    let mut bulk = request();
    bulk.campaign_ids = Some(vec!["1".to_string(), "2".to_string()]);
    let err = engine(&gateway).pause(&bulk).unwrap_err();

    assert!(matches!(err, EngineError::Guardrail(_)));
    assert_eq!(gateway.call_count(), 0);
}

#[test]
fn confirmed_bulk_pause_mutates_every_campaign() {
    let gateway = Arc::new(ScriptedGateway::new());
    for id in ["1", "2", "3"] {
        gateway.push_mutate(&format!("customers/1234567890/campaigns/{id}"));
    }

    let mut bulk = request();
    bulk.campaign_ids = Some(vec!["1".to_string(), "2".to_string(), "3".to_string()]);
    bulk.confirm = true;
    let outcome = engine(&gateway).pause(&bulk).unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.updated_count, 3);
    assert_eq!(gateway.mutations().len(), 3);
}

#[test]
fn bulk_size_over_the_ceiling_is_rejected_even_when_confirmed() {
    let gateway = Arc::new(ScriptedGateway::new());

    let mut oversized = request();
    oversized.campaign_ids = Some((1..=51).map(|id| id.to_string()).collect());
    oversized.confirm = true;
    let err = engine(&gateway).pause(&oversized).unwrap_err();

    assert!(matches!(err, EngineError::Guardrail(_)));
    assert_eq!(gateway.call_count(), 0);
}

#[test]
fn bulk_at_the_ceiling_proceeds_when_confirmed() {
    let gateway = Arc::new(ScriptedGateway::new());
    for id in 1..=50 {
        gateway.push_mutate(&format!("customers/1234567890/campaigns/{id}"));
    }

    let mut at_limit = request();
    at_limit.campaign_ids = Some((1..=50).map(|id| id.to_string()).collect());
    at_limit.confirm = true;
    let outcome = engine(&gateway).pause(&at_limit).unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.updated_count, 50);
}

#[test]
fn per_item_failures_partition_the_outcome() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_mutate("customers/1234567890/campaigns/1");
    gateway.push_mutate_err(campaign_gate_core::GatewayError::Status {
        status: 400,
        body: "invalid campaign".to_string(),
    });

    let mut bulk = request();
    bulk.campaign_ids = Some(vec!["1".to_string(), "2".to_string()]);
    bulk.confirm = true;
    let outcome = engine(&gateway).pause(&bulk).unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.updated_count, 1);
    assert_eq!(outcome.failed_count, 1);
    assert_eq!(outcome.failed[0].id, "2");
    assert!(outcome.failed[0].reason.contains("invalid campaign"));
}

#[test]
fn enabling_a_zero_budget_campaign_is_refused_without_a_write() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_search(vec![campaign_budget_row(
        "42",
        "Spring Sale",
        "customers/1234567890/campaignBudgets/777",
        0,
    )]);

    let mut single = request();
    single.campaign_id = Some("42".to_string());
    let outcome = engine(&gateway).enable(&single).unwrap();

    assert!(!outcome.success);
    assert_eq!(outcome.failed_count, 1);
    assert!(outcome.failed[0].reason.contains("safety check failed"));
    assert_eq!(gateway.mutations().len(), 0);
}

#[test]
fn enabling_a_funded_campaign_succeeds() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_search(vec![campaign_budget_row(
        "42",
        "Spring Sale",
        "customers/1234567890/campaignBudgets/777",
        5_000_000,
    )]);
    gateway.push_mutate("customers/1234567890/campaigns/42");

    let mut single = request();
    single.campaign_id = Some("42".to_string());
    let outcome = engine(&gateway).enable(&single).unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.succeeded[0].new_status, TargetStatus::Enabled);
}

#[test]
fn disabling_the_safety_check_skips_the_budget_read() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_mutate("customers/1234567890/campaigns/42");

    let mut single = request();
    single.campaign_id = Some("42".to_string());
    single.safety_check = false;
    let outcome = engine(&gateway).enable(&single).unwrap();

    assert!(outcome.success);
    assert_eq!(gateway.call_count(), 1);
}

#[test]
fn name_patterns_resolve_remotely_with_like_wildcards() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_search(vec![
        json!({"campaign": {"id": "7", "name": "Test A"}}),
        json!({"campaign": {"id": "8", "name": "Test B"}}),
    ]);
    gateway.push_mutate("customers/1234567890/campaigns/7");
    gateway.push_mutate("customers/1234567890/campaigns/8");

    let mut pattern = request();
    pattern.name_pattern = Some("Test*".to_string());
    pattern.confirm = true;
    let outcome = engine(&gateway).pause(&pattern).unwrap();

    assert!(outcome.success);
    assert_eq!(outcome.updated_count, 2);

    let RecordedCall::Search { query, .. } = &gateway.calls()[0] else {
        panic!("expected the pattern query first");
    };
    assert!(query.contains("LIKE 'Test%'"));
}

#[test]
fn unconfirmed_pattern_is_rejected_before_any_remote_call() {
    let gateway = Arc::new(ScriptedGateway::new());

    let mut pattern = request();
    pattern.name_pattern = Some("Test*".to_string());
    let err = engine(&gateway).pause(&pattern).unwrap_err();

    assert!(matches!(err, EngineError::Guardrail(_)));
    assert!(err.to_string().contains("confirm=true"));
    assert_eq!(gateway.call_count(), 0);
}

#[test]
fn unconfirmed_pattern_enable_is_rejected_before_any_remote_call() {
    let gateway = Arc::new(ScriptedGateway::new());

    let mut pattern = request();
    pattern.name_pattern = Some("Test*".to_string());
    let err = engine(&gateway).enable(&pattern).unwrap_err();

    assert!(matches!(err, EngineError::Guardrail(_)));
    assert_eq!(gateway.call_count(), 0);
}

#[test]
fn empty_pattern_matches_report_not_found() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_search(Vec::new());

    let mut pattern = request();
    pattern.name_pattern = Some("Nothing*".to_string());
    pattern.confirm = true;
    let err = engine(&gateway).pause(&pattern).unwrap_err();

    assert!(matches!(err, EngineError::NotFound(_)));
}

#[test]
fn resource_name_selection_extracts_the_campaign_id() {
    let gateway = Arc::new(ScriptedGateway::new());
    gateway.push_mutate("customers/1234567890/campaigns/42");

    let mut by_name = request();
    by_name.campaign_resource_name = Some("customers/1234567890/campaigns/42".to_string());
    let outcome = engine(&gateway).pause(&by_name).unwrap();

    assert_eq!(outcome.succeeded[0].campaign_id, "42");
}
