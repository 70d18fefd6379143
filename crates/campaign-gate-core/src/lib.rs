// campaign-gate-core/src/lib.rs
// ============================================================================
// Module: Campaign Gate Core Library
// Description: Public API surface for the Campaign Gate core.
// Purpose: Expose domain types, collaborator interfaces, and mutation engines.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Campaign Gate core provides guardrailed mutation orchestration for an
//! advertising platform account: budget adjustments, bidding-target updates,
//! bulk status changes, and multi-step campaign provisioning. It performs no
//! network I/O itself and integrates through the [`interfaces::AdsGateway`]
//! seam rather than embedding a transport.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::*;

pub use interfaces::AdsGateway;
pub use interfaces::AuthHeaders;
pub use interfaces::CredentialError;
pub use interfaces::CredentialSource;
pub use interfaces::GatewayError;
pub use runtime::BiddingEngine;
pub use runtime::BiddingUpdate;
pub use runtime::BiddingUpdateRequest;
pub use runtime::BudgetAdjustment;
pub use runtime::BudgetEngine;
pub use runtime::BudgetUpdate;
pub use runtime::BudgetUpdateRequest;
pub use runtime::CampaignSelector;
pub use runtime::EngineError;
pub use runtime::ProvisioningEngine;
pub use runtime::ProvisioningOutcome;
pub use runtime::ProvisioningRequest;
pub use runtime::ProvisioningStage;
pub use runtime::StatusChange;
pub use runtime::StatusChangeRequest;
pub use runtime::StatusEngine;
pub use runtime::TargetStatus;
