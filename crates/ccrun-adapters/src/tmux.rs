//! Tmux control client.
//!
//! Every operation is one blocking `tmux -S <socket> ...` invocation. The
//! [`Multiplexer`] trait is the seam the session driver talks through, so the
//! driver can be exercised against [`crate::testing::FakeMultiplexer`].

use ccrun_core::{Error, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

/// Number of lines captured for prompt detection and the final snapshot.
pub const CAPTURE_LINES: usize = 200;

/// Identity of the one session an interactive run drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmuxSession {
    socket: PathBuf,
    name: String,
}

impl TmuxSession {
    pub fn new(socket: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            socket: socket.into(),
            name: name.into(),
        }
    }

    pub fn socket(&self) -> &Path {
        &self.socket
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Window/pane target for keystrokes and captures (`<name>:0.0`).
    pub fn target(&self) -> String {
        format!("{}:0.0", self.name)
    }
}

/// Control operations against a terminal multiplexer.
pub trait Multiplexer {
    /// Creates a detached session with window index 0.
    fn new_session(&self, session: &TmuxSession) -> Result<()>;

    /// Kills the session if it exists. Failures are swallowed.
    fn kill_session(&self, session: &TmuxSession);

    /// Types `text` verbatim, without shell or key-name interpretation.
    fn send_literal(&self, session: &TmuxSession, text: &str) -> Result<()>;

    /// Presses Enter once.
    fn send_enter(&self, session: &TmuxSession) -> Result<()>;

    /// Returns the last `lines` lines of the window, wrapped lines joined.
    fn capture(&self, session: &TmuxSession, lines: usize) -> Result<String>;
}

/// [`Multiplexer`] backed by the real tmux binary.
#[derive(Debug, Clone)]
pub struct TmuxClient {
    program: PathBuf,
}

impl TmuxClient {
    /// Creates a client invoking the given tmux executable.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn command(&self, session: &TmuxSession, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("-S").arg(session.socket()).args(args);
        cmd
    }

    /// Runs a control command whose output is not needed.
    ///
    /// Stdio is detached so a daemonizing tmux server never holds our pipes.
    fn run(&self, session: &TmuxSession, action: &str, args: &[&str]) -> Result<()> {
        debug!(action, ?args, "tmux");
        let status = self
            .command(session, args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| self.spawn_error(source))?;
        check_status(action, status)
    }

    fn spawn_error(&self, source: std::io::Error) -> Error {
        Error::Spawn {
            program: self.program.display().to_string(),
            source,
        }
    }
}

impl Default for TmuxClient {
    fn default() -> Self {
        Self::new("tmux")
    }
}

impl Multiplexer for TmuxClient {
    fn new_session(&self, session: &TmuxSession) -> Result<()> {
        self.run(
            session,
            "new-session",
            &["new", "-d", "-s", session.name(), "-n", "shell"],
        )
    }

    fn kill_session(&self, session: &TmuxSession) {
        if let Err(err) = self.run(session, "kill-session", &["kill-session", "-t", session.name()])
        {
            debug!(%err, "No previous session to kill");
        }
    }

    fn send_literal(&self, session: &TmuxSession, text: &str) -> Result<()> {
        let target = session.target();
        self.run(
            session,
            "send-keys",
            &["send-keys", "-t", &target, "-l", "--", text],
        )
    }

    fn send_enter(&self, session: &TmuxSession) -> Result<()> {
        let target = session.target();
        self.run(session, "send-keys", &["send-keys", "-t", &target, "Enter"])
    }

    fn capture(&self, session: &TmuxSession, lines: usize) -> Result<String> {
        let target = session.target();
        let start = format!("-{lines}");
        let output = self
            .command(
                session,
                &["capture-pane", "-p", "-J", "-t", &target, "-S", &start],
            )
            .stdin(Stdio::null())
            .output()
            .map_err(|source| self.spawn_error(source))?;

        if !output.status.success() {
            return Err(Error::Tmux {
                action: "capture-pane".to_string(),
                detail: format!(
                    "{}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn check_status(action: &str, status: ExitStatus) -> Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(Error::Tmux {
            action: action.to_string(),
            detail: status.to_string(),
        })
    }
}
