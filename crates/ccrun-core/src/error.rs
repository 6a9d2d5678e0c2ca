//! Error types shared by every ccrun crate.

use std::path::PathBuf;
use thiserror::Error;

/// Exit code for configuration problems the operator has to fix
/// (missing target binary, missing tmux).
pub const EXIT_SETUP: i32 = 2;

/// Exit code for every other fatal error.
pub const EXIT_FAILURE: i32 = 1;

/// Errors that can occur while launching or steering the target program.
#[derive(Debug, Error)]
pub enum Error {
    /// The claude binary could not be located.
    #[error("claude binary not found: {}", .0.display())]
    BinaryNotFound(PathBuf),

    /// A helper program the selected strategy depends on is missing.
    #[error("{program} not found in PATH; cannot run {purpose}.")]
    MissingProgram {
        program: &'static str,
        purpose: &'static str,
    },

    /// A child process could not be started.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A tmux control command exited unsuccessfully.
    #[error("tmux {action} failed: {detail}")]
    Tmux { action: String, detail: String },

    /// Pseudo-terminal allocation or I/O failed.
    #[error("pty error: {0}")]
    Pty(String),

    /// An argument could not be embedded in a shell command line.
    #[error("cannot quote argument for the shell: {0}")]
    Quote(#[from] shlex::QuoteError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Process exit code this error maps to.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::BinaryNotFound(_) | Error::MissingProgram { .. } => EXIT_SETUP,
            _ => EXIT_FAILURE,
        }
    }

    /// Remediation hint printed after the error message, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Error::BinaryNotFound(_) => Some(
                "Tip: set CLAUDE_CODE_BIN=/path/to/claude or install claude globally.",
            ),
            Error::MissingProgram { program: "tmux", .. } => {
                Some("Tip: install tmux or rerun with --mode headless.")
            }
            _ => None,
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
