//! Argument vectors for the target program and shell quoting.

use crate::config::RunConfig;
use crate::error::Result;
use std::path::Path;

/// Argument vector for a headless run, binary first.
///
/// The prompt is passed with `-p`; output format and JSON schema only make
/// sense here.
pub fn headless_argv(config: &RunConfig) -> Vec<String> {
    let flags = &config.flags;
    let mut argv = vec![config.claude_bin.to_string_lossy().into_owned()];

    push_opt(&mut argv, "--permission-mode", flags.permission_mode.as_deref());
    if let Some(prompt) = &config.prompt {
        argv.push("-p".to_string());
        argv.push(prompt.clone());
    }
    push_opt(&mut argv, "--allowedTools", flags.allowed_tools.as_deref());
    push_opt(
        &mut argv,
        "--output-format",
        flags.output_format.map(|format| format.as_str()),
    );
    push_opt(&mut argv, "--json-schema", flags.json_schema.as_deref());
    push_common_tail(&mut argv, config);
    argv
}

/// Argument vector for the interactive launch, binary first.
///
/// The prompt is typed into the session separately, so it is not part of
/// the command line.
pub fn interactive_argv(config: &RunConfig) -> Vec<String> {
    let flags = &config.flags;
    let mut argv = vec![config.claude_bin.to_string_lossy().into_owned()];

    push_opt(&mut argv, "--permission-mode", flags.permission_mode.as_deref());
    push_opt(&mut argv, "--allowedTools", flags.allowed_tools.as_deref());
    push_common_tail(&mut argv, config);
    argv
}

fn push_common_tail(argv: &mut Vec<String>, config: &RunConfig) {
    let flags = &config.flags;
    push_opt(
        argv,
        "--append-system-prompt",
        flags.append_system_prompt.as_deref(),
    );
    push_opt(argv, "--system-prompt", flags.system_prompt.as_deref());
    if flags.continue_latest {
        argv.push("--continue".to_string());
    }
    push_opt(argv, "--resume", flags.resume.as_deref());
    argv.extend(flags.extra.iter().cloned());
}

fn push_opt(argv: &mut Vec<String>, flag: &str, value: Option<&str>) {
    // Empty values are treated like absent ones.
    if let Some(value) = value.filter(|v| !v.is_empty()) {
        argv.push(flag.to_string());
        argv.push(value.to_string());
    }
}

/// Quotes one string so it survives a POSIX shell as a single word.
pub fn shell_quote(value: &str) -> Result<String> {
    Ok(shlex::try_quote(value)?.into_owned())
}

/// Joins an argument vector into one shell-safe command string.
pub fn shell_join(argv: &[String]) -> Result<String> {
    Ok(shlex::try_join(argv.iter().map(String::as_str))?)
}

/// The line typed into the tmux shell to start the target program:
/// `cd <cwd> && <binary> <flags...>`.
pub fn launch_line(config: &RunConfig, cwd: &Path) -> Result<String> {
    let cd = shell_quote(&cwd.to_string_lossy())?;
    let command = shell_join(&interactive_argv(config))?;
    Ok(format!("cd {cd} && {command}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClaudeFlags, OutputFormat};

    fn full_config() -> RunConfig {
        let mut config = RunConfig::new("/usr/bin/claude").with_prompt("fix bug #42");
        config.flags = ClaudeFlags {
            permission_mode: Some("acceptEdits".to_string()),
            allowed_tools: Some("Bash,Read".to_string()),
            output_format: Some(OutputFormat::StreamJson),
            json_schema: Some("{}".to_string()),
            append_system_prompt: Some("be brief".to_string()),
            system_prompt: Some("you are terse".to_string()),
            continue_latest: true,
            resume: Some("abc123".to_string()),
            extra: vec!["--model".to_string(), "opus".to_string()],
        };
        config
    }

    #[test]
    fn headless_argv_orders_flags() {
        let argv = headless_argv(&full_config());
        assert_eq!(
            argv,
            vec![
                "/usr/bin/claude",
                "--permission-mode",
                "acceptEdits",
                "-p",
                "fix bug #42",
                "--allowedTools",
                "Bash,Read",
                "--output-format",
                "stream-json",
                "--json-schema",
                "{}",
                "--append-system-prompt",
                "be brief",
                "--system-prompt",
                "you are terse",
                "--continue",
                "--resume",
                "abc123",
                "--model",
                "opus",
            ]
        );
    }

    #[test]
    fn interactive_argv_excludes_prompt_and_headless_only_flags() {
        let argv = interactive_argv(&full_config());
        assert!(!argv.contains(&"-p".to_string()));
        assert!(!argv.contains(&"fix bug #42".to_string()));
        assert!(!argv.contains(&"--output-format".to_string()));
        assert!(!argv.contains(&"--json-schema".to_string()));
        assert_eq!(argv.first().map(String::as_str), Some("/usr/bin/claude"));
        assert_eq!(&argv[argv.len() - 2..], ["--model", "opus"]);
    }

    #[test]
    fn minimal_headless_argv_is_just_the_binary() {
        let argv = headless_argv(&RunConfig::new("claude"));
        assert_eq!(argv, vec!["claude"]);
    }

    #[test]
    fn empty_option_values_are_skipped() {
        let mut config = RunConfig::new("claude");
        config.flags.resume = Some(String::new());
        config.flags.permission_mode = Some(String::new());
        assert_eq!(headless_argv(&config), vec!["claude"]);
    }

    #[test]
    fn empty_prompt_is_still_forwarded() {
        let config = RunConfig::new("claude").with_prompt("");
        assert_eq!(headless_argv(&config), vec!["claude", "-p", ""]);
    }

    #[test]
    fn shell_join_quotes_each_argument() {
        let argv = vec![
            "claude".to_string(),
            "-p".to_string(),
            "it's a test".to_string(),
        ];
        let joined = shell_join(&argv).unwrap();
        assert!(joined.starts_with("claude -p "));
        assert_ne!(joined, "claude -p it's a test");
    }

    #[test]
    fn shell_quote_rejects_nul_bytes() {
        assert!(shell_quote("bad\0arg").is_err());
        assert_eq!(shell_quote("plain").unwrap(), "plain");
    }

    #[test]
    fn launch_line_changes_directory_first() {
        let config = RunConfig::new("/usr/bin/claude");
        let line = launch_line(&config, Path::new("/work/my repo")).unwrap();
        assert!(line.starts_with("cd "));
        assert!(line.contains("'/work/my repo'") || line.contains("\"/work/my repo\""));
        assert!(line.ends_with("&& /usr/bin/claude"));
    }
}
