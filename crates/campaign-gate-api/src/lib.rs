// campaign-gate-api/src/lib.rs
// ============================================================================
// Module: Campaign Gate API
// Description: REST gateway to the Google Ads API.
// Purpose: Implement the core gateway and credential seams over HTTP.
// Dependencies: campaign-gate-core, reqwest, serde_json
// ============================================================================

//! ## Overview
//! Transport crate for Campaign Gate: a blocking REST client implementing
//! the core [`campaign_gate_core::AdsGateway`] trait, plus credential
//! sources that produce the per-request authentication headers. All domain
//! logic stays in the core crate; this crate only moves JSON over HTTP.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod client;
pub mod credentials;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use client::GoogleAdsClient;
pub use client::GoogleAdsConfig;
pub use credentials::StaticCredentialSource;
