//! # ccrun-adapters
//!
//! Process-facing pieces of ccrun.
//!
//! - [`PtyRunner`] runs a headless command under `script(1)`, a native PTY,
//!   or directly, and reports the child's exit code.
//! - [`TmuxClient`] implements the [`Multiplexer`] control operations.
//! - [`SessionDriver`] is the interactive state machine built on top of a
//!   [`Multiplexer`] and a [`Pacer`].
//! - [`testing`] holds scripted doubles for both seams.

mod driver;
mod pty_runner;
pub mod testing;
mod tmux;
mod wait;

pub use driver::{DriverState, SessionDriver};
pub use pty_runner::{Invocation, PtyRunner, TerminalSize, exit_code};
pub use tmux::{CAPTURE_LINES, Multiplexer, TmuxClient, TmuxSession};
pub use wait::{Pacer, SystemPacer, wait_for_text};
