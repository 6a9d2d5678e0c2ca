//! # ccrun-cli
//!
//! Binary entry point for ccrun.
//!
//! This crate provides:
//! - CLI argument parsing using `clap`
//! - Logging setup (`CCRUN_LOG`, `--verbose`)
//! - Layering of flags over `ccrun.yml` into a run configuration
//! - Dispatch to the headless runner or the interactive tmux driver

mod launch;
mod settings;

use anyhow::{Context, Result};
use ccrun_core::{ExecutionMode, OutputFormat, PtyStrategy};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter directive.
const LOG_ENV: &str = "CCRUN_LOG";

/// Execution mode selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
enum ModeArg {
    /// Interactive when any prompt line starts with `/`, headless otherwise
    #[default]
    Auto,
    /// One-shot run under a pseudo-terminal
    Headless,
    /// Drive the program inside a detached tmux session
    Interactive,
}

impl From<ModeArg> for ExecutionMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Auto => ExecutionMode::Auto,
            ModeArg::Headless => ExecutionMode::Headless,
            ModeArg::Interactive => ExecutionMode::Interactive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormatArg {
    Text,
    Json,
    StreamJson,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(format: OutputFormatArg) -> Self {
        match format {
            OutputFormatArg::Text => OutputFormat::Text,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::StreamJson => OutputFormat::StreamJson,
        }
    }
}

/// Pseudo-terminal strategy for headless runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PtyArg {
    /// Use `script` when available, otherwise run directly
    Auto,
    /// Allocate a PTY in-process
    Native,
    /// Never emulate a terminal
    Off,
}

impl From<PtyArg> for PtyStrategy {
    fn from(pty: PtyArg) -> Self {
        match pty {
            PtyArg::Auto => PtyStrategy::Auto,
            PtyArg::Native => PtyStrategy::Native,
            PtyArg::Off => PtyStrategy::Off,
        }
    }
}

/// Run the claude CLI reliably (headless or interactive via tmux)
#[derive(Parser, Debug)]
#[command(name = "ccrun", version, about)]
struct Cli {
    /// Prompt text
    #[arg(short = 'p', long)]
    prompt: Option<String>,

    /// Execution mode
    #[arg(long, value_enum, default_value_t = ModeArg::Auto)]
    mode: ModeArg,

    /// Permission mode passed to claude
    #[arg(long = "permission-mode", value_name = "MODE")]
    permission_mode: Option<String>,

    /// Allowed tools allowlist string
    #[arg(long = "allowedTools", value_name = "TOOLS")]
    allowed_tools: Option<String>,

    /// Output format (headless only)
    #[arg(long = "output-format", value_enum)]
    output_format: Option<OutputFormatArg>,

    /// JSON schema for structured output (headless only)
    #[arg(long = "json-schema", value_name = "SCHEMA")]
    json_schema: Option<String>,

    /// Append to the default system prompt
    #[arg(long = "append-system-prompt", value_name = "TEXT")]
    append_system_prompt: Option<String>,

    /// Replace the system prompt
    #[arg(long = "system-prompt", value_name = "TEXT")]
    system_prompt: Option<String>,

    /// Continue the most recent session
    #[arg(long = "continue")]
    continue_latest: bool,

    /// Resume a specific session ID
    #[arg(long, value_name = "ID")]
    resume: Option<String>,

    /// Path to the claude binary (cli > config > CLAUDE_CODE_BIN > PATH)
    #[arg(long = "claude-bin", value_name = "PATH")]
    claude_bin: Option<PathBuf>,

    /// Working directory for the target program
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// tmux session name [default: cc]
    #[arg(long = "tmux-session", value_name = "NAME")]
    tmux_session: Option<String>,

    /// tmux socket directory
    #[arg(long = "tmux-socket-dir", value_name = "DIR")]
    tmux_socket_dir: Option<PathBuf>,

    /// tmux socket file name [default: claude-code.sock]
    #[arg(long = "tmux-socket-name", value_name = "NAME")]
    tmux_socket_name: Option<String>,

    /// Wait N seconds after delivery, then print a snapshot [default: 0]
    #[arg(long = "interactive-wait-s", value_name = "SECS")]
    interactive_wait_s: Option<u64>,

    /// Delay between prompt lines in interactive mode [default: 800]
    #[arg(long = "interactive-send-delay-ms", value_name = "MS")]
    interactive_send_delay_ms: Option<u64>,

    /// Path to configuration file
    #[arg(short, long, default_value = "ccrun.yml")]
    config: PathBuf,

    /// Pseudo-terminal strategy for headless runs [default: auto]
    #[arg(long, value_enum)]
    pty: Option<PtyArg>,

    /// Show what would be executed without running
    #[arg(long)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Extra arguments forwarded verbatim to claude (after `--`)
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "EXTRA")]
    extra: Vec<String>,
}

impl Cli {
    /// Trailing arguments without a leading `--` separator.
    fn extra_args(&self) -> Vec<String> {
        match self.extra.split_first() {
            Some((first, rest)) if first == "--" => rest.to_vec(),
            _ => self.extra.clone(),
        }
    }
}

/// Filter directive for the subscriber: `CCRUN_LOG` > `--verbose` > `warn`.
fn log_filter(env_value: Option<String>, verbose: bool) -> String {
    env_value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| if verbose { "debug" } else { "warn" }.to_string())
}

fn init_logging(verbose: bool) {
    let filter = log_filter(std::env::var(LOG_ENV).ok(), verbose);

    // stdout belongs to the operator text and the child's output.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(code) => exit_status(code),
        Err(err) => {
            eprintln!("{err:#}");
            let core_err = err.downcast_ref::<ccrun_core::Error>();
            if let Some(hint) = core_err.and_then(ccrun_core::Error::hint) {
                eprintln!("{hint}");
            }
            exit_status(core_err.map_or(ccrun_core::EXIT_FAILURE, ccrun_core::Error::exit_code))
        }
    }
}

fn run(cli: &Cli) -> Result<i32> {
    let file = ccrun_core::FileConfig::load_optional(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    let config = settings::build_run_config(cli, &file, ccrun_core::process_env)?;
    let mut stdout = std::io::stdout();
    let code = launch::launch(&config, cli.dry_run, ccrun_core::process_env, &mut stdout)?;
    Ok(code)
}

fn exit_status(code: i32) -> ExitCode {
    ExitCode::from(exit_byte(code))
}

/// Exit statuses are a single byte.
fn exit_byte(code: i32) -> u8 {
    u8::try_from(code & 0xff).unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headless_flags() {
        let cli = Cli::try_parse_from([
            "ccrun",
            "-p",
            "fix bug",
            "--mode",
            "headless",
            "--output-format",
            "stream-json",
            "--allowedTools",
            "Bash,Read",
            "--continue",
        ])
        .unwrap();

        assert_eq!(cli.prompt.as_deref(), Some("fix bug"));
        assert_eq!(cli.mode, ModeArg::Headless);
        assert_eq!(cli.output_format, Some(OutputFormatArg::StreamJson));
        assert_eq!(cli.allowed_tools.as_deref(), Some("Bash,Read"));
        assert!(cli.continue_latest);
        assert_eq!(cli.config, PathBuf::from("ccrun.yml"));
    }

    #[test]
    fn trailing_args_after_separator_are_forwarded() {
        let cli =
            Cli::try_parse_from(["ccrun", "-p", "hi", "--", "--model", "opus", "-x"]).unwrap();
        assert_eq!(cli.extra_args(), vec!["--model", "opus", "-x"]);
    }

    #[test]
    fn mode_defaults_to_auto() {
        let cli = Cli::try_parse_from(["ccrun"]).unwrap();
        assert_eq!(ExecutionMode::from(cli.mode), ExecutionMode::Auto);
        assert!(cli.extra_args().is_empty());
    }

    #[test]
    fn rejects_unknown_mode() {
        assert!(Cli::try_parse_from(["ccrun", "--mode", "batch"]).is_err());
    }

    #[test]
    fn log_env_overrides_verbose_flag() {
        let from_env = Some("ccrun_adapters=trace".to_string());
        assert_eq!(log_filter(from_env.clone(), true), "ccrun_adapters=trace");
        assert_eq!(log_filter(from_env, false), "ccrun_adapters=trace");
    }

    #[test]
    fn log_filter_falls_back_to_verbosity() {
        assert_eq!(log_filter(None, true), "debug");
        assert_eq!(log_filter(None, false), "warn");
        // Blank is treated as unset.
        assert_eq!(log_filter(Some("  ".to_string()), true), "debug");
        assert_eq!(log_filter(Some(String::new()), false), "warn");
    }

    #[test]
    fn exit_status_keeps_low_byte() {
        assert_eq!(exit_byte(0), 0);
        assert_eq!(exit_byte(137), 137);
        assert_eq!(exit_byte(256 + 3), 3);
    }
}
