//! Headless execution under a pseudo-terminal.
//!
//! The target program misbehaves when stdout is not a terminal, so headless
//! runs wrap it. The default wraps it in `script -q -c <cmd> /dev/null`; when
//! `script` is unavailable the program runs directly. A native PTY opened
//! in-process is available as an alternative to `script`.

use ccrun_core::{EXIT_FAILURE, Error, PtyStrategy, Result, shell_join};
use portable_pty::{CommandBuilder, PtySize, native_pty_system};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::{debug, warn};

/// Terminal dimensions used for native PTYs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub rows: u16,
    pub cols: u16,
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self { rows: 24, cols: 80 }
    }
}

impl TerminalSize {
    /// Reads `LINES` and `COLUMNS`, falling back to 24x80.
    pub fn from_env<F>(env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            rows: env("LINES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rows),
            cols: env("COLUMNS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.cols),
        }
    }
}

/// How a headless run will actually be executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// `script -q -c <command> /dev/null`
    Script { helper: PathBuf, command: String },
    /// In-process pseudo-terminal.
    Native { argv: Vec<String> },
    /// Plain child process with inherited stdio.
    Direct { argv: Vec<String> },
}

impl Invocation {
    /// Human-readable rendering for dry runs.
    pub fn describe(&self) -> Result<String> {
        Ok(match self {
            Invocation::Script { helper, command } => shell_join(&[
                helper.to_string_lossy().into_owned(),
                "-q".to_string(),
                "-c".to_string(),
                command.clone(),
                "/dev/null".to_string(),
            ])?,
            Invocation::Native { argv } => format!("(native pty) {}", shell_join(argv)?),
            Invocation::Direct { argv } => shell_join(argv)?,
        })
    }
}

/// Runs one headless command to completion.
#[derive(Debug, Clone)]
pub struct PtyRunner {
    strategy: PtyStrategy,
    script: Option<PathBuf>,
    size: TerminalSize,
}

impl PtyRunner {
    /// `script` is the resolved `script(1)` helper, if any.
    pub fn new(strategy: PtyStrategy, script: Option<PathBuf>) -> Self {
        Self {
            strategy,
            script,
            size: TerminalSize::default(),
        }
    }

    #[must_use]
    pub fn with_size(mut self, size: TerminalSize) -> Self {
        self.size = size;
        self
    }

    /// Decides how `argv` will be executed without running anything.
    pub fn plan(&self, argv: &[String]) -> Result<Invocation> {
        if argv.is_empty() {
            return Err(Error::Config("empty command line".to_string()));
        }
        let argv = argv.to_vec();
        Ok(match (self.strategy, &self.script) {
            (PtyStrategy::Native, _) => Invocation::Native { argv },
            (PtyStrategy::Off, _) => Invocation::Direct { argv },
            (PtyStrategy::Auto, Some(helper)) => Invocation::Script {
                helper: helper.clone(),
                command: shell_join(&argv)?,
            },
            (PtyStrategy::Auto, None) => {
                debug!("script not found, running without a pseudo-terminal");
                Invocation::Direct { argv }
            }
        })
    }

    /// Runs `argv` and returns the child's exit code.
    ///
    /// Output streams straight through to our stdout/stderr.
    pub fn run(&self, argv: &[String], cwd: Option<&Path>) -> Result<i32> {
        let invocation = self.plan(argv)?;
        debug!(?invocation, "Starting headless run");
        match invocation {
            Invocation::Script { helper, command } => {
                let mut cmd = Command::new(&helper);
                cmd.args(["-q", "-c", command.as_str(), "/dev/null"]);
                run_child(cmd, &helper.to_string_lossy(), cwd)
            }
            Invocation::Direct { argv } => {
                let mut cmd = Command::new(&argv[0]);
                cmd.args(&argv[1..]);
                run_child(cmd, &argv[0], cwd)
            }
            Invocation::Native { argv } => self.run_native(&argv, cwd),
        }
    }

    fn run_native(&self, argv: &[String], cwd: Option<&Path>) -> Result<i32> {
        let pair = native_pty_system()
            .openpty(PtySize {
                rows: self.size.rows,
                cols: self.size.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| Error::Pty(e.to_string()))?;

        let mut cmd_builder = CommandBuilder::new(&argv[0]);
        cmd_builder.args(&argv[1..]);
        let workdir = match cwd {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir()?,
        };
        cmd_builder.cwd(workdir);
        cmd_builder.env("TERM", "xterm-256color");

        let mut child = pair
            .slave
            .spawn_command(cmd_builder)
            .map_err(|e| Error::Pty(format!("failed to spawn {}: {e}", argv[0])))?;
        // Only the child may hold the slave side, or reads never see EOF.
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| Error::Pty(e.to_string()))?;
        let pump = std::thread::spawn(move || pump_output(reader));

        let status = child.wait()?;
        if pump.join().is_err() {
            warn!("PTY output thread panicked");
        }
        drop(pair.master);

        let code = i32::try_from(status.exit_code()).unwrap_or(EXIT_FAILURE);
        debug!(code, "Native PTY child exited");
        Ok(code)
    }
}

fn run_child(mut cmd: Command, program: &str, cwd: Option<&Path>) -> Result<i32> {
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let status = cmd.status().map_err(|source| Error::Spawn {
        program: program.to_string(),
        source,
    })?;
    let code = exit_code(status);
    debug!(code, "Child exited");
    Ok(code)
}

/// Copies PTY output to stdout until the slave side closes.
fn pump_output(mut reader: Box<dyn Read + Send>) {
    let mut stdout = std::io::stdout();
    let mut buf = [0u8; 4096];
    loop {
        match reader.read(&mut buf) {
            // EIO once the child has exited is the normal end of stream on Linux.
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if stdout.write_all(&buf[..n]).is_err() {
                    break;
                }
                let _ = stdout.flush();
            }
        }
    }
}

/// Maps a child's status to our exit code; signals become `128 + signal`.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    EXIT_FAILURE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".to_string(), "-c".to_string(), script.to_string()]
    }

    #[test]
    fn auto_without_script_runs_directly() {
        let runner = PtyRunner::new(PtyStrategy::Auto, None);
        let plan = runner.plan(&sh("exit 0")).unwrap();
        assert_eq!(plan, Invocation::Direct { argv: sh("exit 0") });
    }

    #[test]
    fn auto_with_script_wraps_the_joined_command() {
        let runner = PtyRunner::new(PtyStrategy::Auto, Some(PathBuf::from("/usr/bin/script")));
        let argv = vec!["claude".to_string(), "-p".to_string(), "fix it".to_string()];

        match runner.plan(&argv).unwrap() {
            Invocation::Script { helper, command } => {
                assert_eq!(helper, PathBuf::from("/usr/bin/script"));
                assert_eq!(shlex::split(&command).unwrap(), argv);
            }
            other => panic!("expected script invocation, got {other:?}"),
        }
    }

    #[test]
    fn off_ignores_available_script() {
        let runner = PtyRunner::new(PtyStrategy::Off, Some(PathBuf::from("/usr/bin/script")));
        assert!(matches!(
            runner.plan(&sh("true")).unwrap(),
            Invocation::Direct { .. }
        ));
    }

    #[test]
    fn describe_renders_script_wrapper() {
        let invocation = Invocation::Script {
            helper: PathBuf::from("script"),
            command: "claude -p hi".to_string(),
        };
        assert_eq!(
            invocation.describe().unwrap(),
            "script -q -c 'claude -p hi' /dev/null"
        );
    }

    #[test]
    fn empty_argv_is_rejected() {
        let runner = PtyRunner::new(PtyStrategy::Off, None);
        assert!(runner.plan(&[]).is_err());
    }

    #[test]
    fn terminal_size_reads_lines_and_columns() {
        let size = TerminalSize::from_env(|key| match key {
            "LINES" => Some("50".to_string()),
            "COLUMNS" => Some("not-a-number".to_string()),
            _ => None,
        });
        assert_eq!(size, TerminalSize { rows: 50, cols: 80 });
    }

    #[cfg(unix)]
    #[test]
    fn direct_run_propagates_exit_code() {
        let runner = PtyRunner::new(PtyStrategy::Off, None);
        assert_eq!(runner.run(&sh("exit 3"), None).unwrap(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn direct_run_honours_cwd() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("marker"), "").unwrap();
        let runner = PtyRunner::new(PtyStrategy::Off, None);

        let code = runner
            .run(&sh("test -f marker"), Some(temp_dir.path()))
            .unwrap();
        assert_eq!(code, 0);
    }

    #[cfg(unix)]
    #[test]
    fn signal_death_maps_to_128_plus_signal() {
        let runner = PtyRunner::new(PtyStrategy::Off, None);
        assert_eq!(runner.run(&sh("kill -9 $$"), None).unwrap(), 137);
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let runner = PtyRunner::new(PtyStrategy::Off, None);
        let err = runner
            .run(&["/nonexistent/claude".to_string()], None)
            .unwrap_err();
        assert!(matches!(err, Error::Spawn { .. }), "{err}");
    }

    #[cfg(unix)]
    #[test]
    fn native_pty_propagates_exit_code() {
        let runner = PtyRunner::new(PtyStrategy::Native, None);
        assert_eq!(runner.run(&sh("echo hello; exit 4"), None).unwrap(), 4);
    }
}
