//! Dispatch of a resolved [`RunConfig`] to the headless or interactive path.

use ccrun_adapters::{PtyRunner, SessionDriver, SystemPacer, TerminalSize, TmuxClient, TmuxSession};
use ccrun_core::{
    BinaryResolver, EffectiveMode, Error, Result, RunConfig, headless_argv, launch_line,
    prompt_queue, select_mode,
};
use std::io::Write;
use tracing::info;

/// Runs the target program and returns this process's exit code.
///
/// With `dry_run` the chosen mode and command are written to `out` and
/// nothing is spawned.
pub fn launch<F>(config: &RunConfig, dry_run: bool, env: F, out: &mut dyn Write) -> Result<i32>
where
    F: Fn(&str) -> Option<String>,
{
    if !config.claude_bin.exists() {
        return Err(Error::BinaryNotFound(config.claude_bin.clone()));
    }

    let mode = select_mode(config.prompt.as_deref(), config.mode);
    info!(mode = mode.as_str(), "Selected execution mode");

    match mode {
        EffectiveMode::Headless => run_headless(config, dry_run, &env, out),
        EffectiveMode::Interactive => run_interactive(config, dry_run, &env, out),
    }
}

fn run_headless<F>(config: &RunConfig, dry_run: bool, env: &F, out: &mut dyn Write) -> Result<i32>
where
    F: Fn(&str) -> Option<String>,
{
    let argv = headless_argv(config);
    let script = BinaryResolver::program("script").resolve(env);
    let runner = PtyRunner::new(config.pty, script).with_size(TerminalSize::from_env(env));

    if dry_run {
        let invocation = runner.plan(&argv)?;
        writeln!(out, "Dry run mode: headless")?;
        writeln!(out, "  Command: {}", invocation.describe()?)?;
        if let Some(cwd) = &config.cwd {
            writeln!(out, "  Working directory: {}", cwd.display())?;
        }
        return Ok(0);
    }

    out.flush()?;
    runner.run(&argv, config.cwd.as_deref())
}

fn run_interactive<F>(
    config: &RunConfig,
    dry_run: bool,
    env: &F,
    out: &mut dyn Write,
) -> Result<i32>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(tmux) = BinaryResolver::program("tmux").resolve(env) else {
        return Err(Error::MissingProgram {
            program: "tmux",
            purpose: "interactive mode",
        });
    };

    let cwd = match &config.cwd {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let line = launch_line(config, &cwd)?;
    let session = TmuxSession::new(config.tmux.socket_path(env), config.tmux.session.clone());

    if dry_run {
        writeln!(out, "Dry run mode: interactive")?;
        writeln!(out, "  tmux: {}", tmux.display())?;
        writeln!(out, "  Socket: {}", session.socket().display())?;
        writeln!(out, "  Session: {}", session.name())?;
        writeln!(out, "  Launch: {line}")?;
        for prompt_line in prompt_queue(config.prompt.as_deref().unwrap_or_default()) {
            writeln!(out, "  Send: {prompt_line}")?;
        }
        return Ok(0);
    }

    SessionDriver::new(
        TmuxClient::new(tmux),
        SystemPacer,
        session,
        line,
        config.interactive.clone(),
    )
    .with_prompt(config.prompt.clone())
    .run(out)
}
