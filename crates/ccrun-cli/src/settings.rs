//! Layers command-line flags over the config file into a [`RunConfig`].
//!
//! Precedence for every knob: CLI flag > `ccrun.yml` > built-in default.

use crate::Cli;
use ccrun_core::{BinaryResolver, ClaudeFlags, FileConfig, Result, RunConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

pub fn build_run_config<F>(cli: &Cli, file: &FileConfig, env: F) -> Result<RunConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let explicit = cli.claude_bin.clone().or_else(|| file.claude_bin.clone());
    // Existence is checked at launch so a bad path reports the path itself.
    let claude_bin = BinaryResolver::claude(explicit)
        .resolve(&env)
        .unwrap_or_else(|| PathBuf::from("claude"));
    debug!(claude_bin = %claude_bin.display(), "Using claude binary");

    let flags = ClaudeFlags {
        permission_mode: cli.permission_mode.clone(),
        allowed_tools: cli.allowed_tools.clone(),
        output_format: cli.output_format.map(Into::into),
        json_schema: cli.json_schema.clone(),
        append_system_prompt: cli.append_system_prompt.clone(),
        system_prompt: cli.system_prompt.clone(),
        continue_latest: cli.continue_latest,
        resume: cli.resume.clone(),
        extra: cli.extra_args(),
    };
    flags.validate()?;

    let mut tmux = file.tmux_settings();
    if let Some(session) = &cli.tmux_session {
        tmux.session.clone_from(session);
    }
    if let Some(dir) = &cli.tmux_socket_dir {
        tmux.socket_dir = Some(dir.clone());
    }
    if let Some(name) = &cli.tmux_socket_name {
        tmux.socket_name.clone_from(name);
    }

    let mut interactive = file.interactive_settings();
    if let Some(secs) = cli.interactive_wait_s {
        interactive.wait = Duration::from_secs(secs);
    }
    if let Some(ms) = cli.interactive_send_delay_ms {
        interactive.send_delay = Duration::from_millis(ms);
    }

    let pty = cli
        .pty
        .map(Into::into)
        .or(file.headless.pty)
        .unwrap_or_default();

    Ok(RunConfig {
        claude_bin,
        prompt: cli.prompt.clone(),
        mode: cli.mode.into(),
        flags,
        cwd: cli.cwd.clone(),
        pty,
        tmux,
        interactive,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ccrun_core::{Error, ExecutionMode, OutputFormat, PtyStrategy};
    use clap::Parser;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["ccrun"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_without_flags_or_file() {
        let config = build_run_config(&parse(&[]), &FileConfig::default(), no_env).unwrap();

        assert_eq!(config.mode, ExecutionMode::Auto);
        assert_eq!(config.pty, PtyStrategy::Auto);
        assert_eq!(config.tmux.session, "cc");
        assert_eq!(config.tmux.socket_name, "claude-code.sock");
        assert_eq!(config.interactive.send_delay, Duration::from_millis(800));
        assert_eq!(config.interactive.wait, Duration::ZERO);
        assert!(config.prompt.is_none());
    }

    #[test]
    fn flags_override_config_file() {
        let file = FileConfig::parse_yaml(
            r"
claude_bin: /from/file/claude
headless:
  pty: native
tmux:
  session: nightly
  socket_name: file.sock
interactive:
  send_delay_ms: 250
  wait_secs: 9
",
        )
        .unwrap();
        let cli = parse(&[
            "--claude-bin",
            "/from/flag/claude",
            "--pty",
            "off",
            "--tmux-session",
            "adhoc",
            "--interactive-send-delay-ms",
            "100",
        ]);

        let config = build_run_config(&cli, &file, no_env).unwrap();

        assert_eq!(config.claude_bin, PathBuf::from("/from/flag/claude"));
        assert_eq!(config.pty, PtyStrategy::Off);
        assert_eq!(config.tmux.session, "adhoc");
        assert_eq!(config.tmux.socket_name, "file.sock");
        assert_eq!(config.interactive.send_delay, Duration::from_millis(100));
        assert_eq!(config.interactive.wait, Duration::from_secs(9));
    }

    #[test]
    fn config_file_binary_beats_environment() {
        let file = FileConfig {
            claude_bin: Some(PathBuf::from("/from/file/claude")),
            ..FileConfig::default()
        };
        let env = |key: &str| (key == "CLAUDE_CODE_BIN").then(|| "/from/env/claude".to_string());

        let config = build_run_config(&parse(&[]), &file, env).unwrap();
        assert_eq!(config.claude_bin, PathBuf::from("/from/file/claude"));
    }

    #[test]
    fn environment_binary_used_without_flag() {
        let env = |key: &str| (key == "CLAUDE_CODE_BIN").then(|| "/from/env/claude".to_string());
        let config = build_run_config(&parse(&[]), &FileConfig::default(), env).unwrap();
        assert_eq!(config.claude_bin, PathBuf::from("/from/env/claude"));
    }

    #[test]
    fn forwards_claude_flags() {
        let cli = parse(&[
            "-p",
            "/compact",
            "--mode",
            "interactive",
            "--permission-mode",
            "plan",
            "--output-format",
            "json",
            "--json-schema",
            r#"{"type":"object"}"#,
            "--resume",
            "abc",
            "--",
            "--model",
            "opus",
        ]);

        let config = build_run_config(&cli, &FileConfig::default(), no_env).unwrap();

        assert_eq!(config.prompt.as_deref(), Some("/compact"));
        assert_eq!(config.mode, ExecutionMode::Interactive);
        assert_eq!(config.flags.permission_mode.as_deref(), Some("plan"));
        assert_eq!(config.flags.output_format, Some(OutputFormat::Json));
        assert_eq!(config.flags.resume.as_deref(), Some("abc"));
        assert_eq!(config.flags.extra, vec!["--model", "opus"]);
    }

    #[test]
    fn invalid_json_schema_is_rejected() {
        let cli = parse(&["--json-schema", "{oops"]);
        let err = build_run_config(&cli, &FileConfig::default(), no_env).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
