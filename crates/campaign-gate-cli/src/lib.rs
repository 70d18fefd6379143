// campaign-gate-cli/src/lib.rs
// ============================================================================
// Module: Campaign Gate CLI Library
// Description: Shared helpers for the Campaign Gate command-line interface.
// Purpose: Provide reusable components for the CLI binary and tests.
// Dependencies: campaign-gate-mcp, std.
// ============================================================================

//! ## Overview
//! This library module houses shared CLI utilities. The binary entry point
//! (`src/main.rs`) imports these helpers so the bind-safety policy can be
//! exercised by tests without spawning the binary.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Network exposure policy checks for the server launcher.
pub mod serve_policy;
