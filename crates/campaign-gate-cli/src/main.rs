// campaign-gate-cli/src/main.rs
// ============================================================================
// Module: Campaign Gate CLI Entry Point
// Description: Command dispatcher for the Campaign Gate MCP server.
// Purpose: Launch the mutation gateway safely and inspect guardrail policy.
// Dependencies: campaign-gate-core, campaign-gate-mcp, clap, serde_json, tokio.
// ============================================================================

//! ## Overview
//! The Campaign Gate CLI launches the local MCP server and prints the
//! effective guardrail policy. Binding to a non-loopback address requires an
//! explicit opt-in plus bearer auth; the launcher fails closed otherwise.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use campaign_gate_cli::serve_policy::BindOutcome;
use campaign_gate_cli::serve_policy::enforce_local_only;
use campaign_gate_cli::serve_policy::resolve_allow_non_loopback;
use campaign_gate_core::GuardrailConfig;
use campaign_gate_core::micros_to_currency;
use campaign_gate_mcp::CampaignGateConfig;
use campaign_gate_mcp::McpServer;
use campaign_gate_mcp::ServerAuthMode;
use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: CLI Definition
// ============================================================================

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "campaign-gate", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Prints the CLI version.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the MCP server from configuration.
    Serve(ServeCommand),
    /// Print the effective guardrail policy as JSON.
    Guardrails(GuardrailsCommand),
}

/// Arguments for the `serve` command.
#[derive(Args, Debug)]
struct ServeCommand {
    /// Optional config file path (defaults to campaign-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Allow binding the HTTP transport to non-loopback addresses (requires auth).
    #[arg(long, action = ArgAction::SetTrue)]
    allow_non_loopback: bool,
}

/// Arguments for the `guardrails` command.
#[derive(Args, Debug)]
struct GuardrailsCommand {
    /// Optional config file path (defaults to campaign-gate.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Terminal CLI error carrying a user-facing message.
#[derive(Debug)]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("campaign-gate {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve(command) => command_serve(command).await,
        Commands::Guardrails(command) => command_guardrails(&command),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: ServeCommand) -> CliResult<ExitCode> {
    let config = CampaignGateConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let allow_non_loopback = resolve_allow_non_loopback(command.allow_non_loopback)
        .map_err(|err| CliError::new(err.to_string()))?;
    let bind_outcome = enforce_local_only(&config, allow_non_loopback)
        .map_err(|err| CliError::new(err.to_string()))?;
    warn_local_only(&config)?;
    if bind_outcome.network_exposed {
        warn_network_exposure(&bind_outcome)?;
    }

    let server = tokio::task::spawn_blocking(move || McpServer::from_config(config))
        .await
        .map_err(|err| CliError::new(format!("server init failed: init join failed: {err}")))?
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    server
        .serve()
        .await
        .map_err(|err| CliError::new(format!("server terminated with error: {err}")))?;

    Ok(ExitCode::SUCCESS)
}

/// Emits a reminder when the server only accepts local callers.
fn warn_local_only(config: &CampaignGateConfig) -> CliResult<()> {
    let auth_mode = config.server.auth.as_ref().map_or(ServerAuthMode::LocalOnly, |auth| auth.mode);
    if auth_mode != ServerAuthMode::LocalOnly {
        return Ok(());
    }
    write_stderr_line("campaign-gate: auth mode is local_only; remote callers will be rejected")
        .map_err(|err| CliError::new(output_error("stderr", &err)))
}

/// Emits a warning describing the network-exposed bind.
fn warn_network_exposure(outcome: &BindOutcome) -> CliResult<()> {
    let bind = outcome.bind_addr.map_or_else(|| "<unknown>".to_string(), |addr| addr.to_string());
    write_stderr_line(&format!(
        "campaign-gate: WARNING: serving campaign mutations on non-loopback address {bind}"
    ))
    .map_err(|err| CliError::new(output_error("stderr", &err)))
}

// ============================================================================
// SECTION: Guardrails Command
// ============================================================================

/// Executes the `guardrails` command.
fn command_guardrails(command: &GuardrailsCommand) -> CliResult<ExitCode> {
    let config = CampaignGateConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    let report = guardrail_report(&config.guardrails.to_policy());
    let rendered = serde_json::to_string_pretty(&report)
        .map_err(|err| CliError::new(format!("failed to render guardrail report: {err}")))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Builds the guardrail policy report payload.
fn guardrail_report(policy: &GuardrailConfig) -> Value {
    json!({
        "dry_run_enabled": policy.dry_run,
        "require_confirmation": policy.require_confirmation,
        "max_budget_micros": policy.max_budget_micros,
        "max_budget_currency": micros_to_currency(policy.max_budget_micros),
        "max_campaigns_bulk": policy.max_bulk_count,
    })
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Prints top-level help to stdout.
fn show_help() -> CliResult<()> {
    Cli::command()
        .print_help()
        .map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output failure message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Writes an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::missing_docs_in_private_items,
        reason = "Test-only panic-based assertions are permitted."
    )]
    use campaign_gate_core::GuardrailConfig;
    use clap::Parser;

    use super::Cli;
    use super::Commands;
    use super::guardrail_report;

    #[test]
    fn parses_serve_with_flags() {
        let cli = Cli::try_parse_from([
            "campaign-gate",
            "serve",
            "--config",
            "/tmp/campaign-gate.toml",
            "--allow-non-loopback",
        ])
        .expect("parse serve");
        let Some(Commands::Serve(serve)) = cli.command else {
            panic!("expected serve command");
        };
        assert!(serve.allow_non_loopback);
        assert_eq!(serve.config.expect("config path").to_string_lossy(), "/tmp/campaign-gate.toml");
    }

    #[test]
    fn parses_guardrails_without_config() {
        let cli =
            Cli::try_parse_from(["campaign-gate", "guardrails"]).expect("parse guardrails");
        assert!(matches!(cli.command, Some(Commands::Guardrails(_))));
    }

    #[test]
    fn guardrail_report_carries_currency_ceiling() {
        let report = guardrail_report(&GuardrailConfig::default());
        assert_eq!(report["dry_run_enabled"], false);
        assert_eq!(report["require_confirmation"], true);
        assert_eq!(report["max_budget_micros"], 100_000_000_000_i64);
        assert_eq!(report["max_budget_currency"], 100_000.0);
        assert_eq!(report["max_campaigns_bulk"], 50);
    }
}
