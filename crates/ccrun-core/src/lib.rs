//! # ccrun-core
//!
//! Shared building blocks for ccrun, the wrapper that runs the `claude` CLI
//! reliably in places without a terminal.
//!
//! This crate provides:
//! - The immutable run configuration and the optional `ccrun.yml` file
//! - Headless vs. interactive mode selection
//! - Ordered binary resolution (flag, env override, `PATH`, fixed locations)
//! - Argument vectors for the target program and shell quoting
//! - The error type every other crate reports through

pub mod command;
pub mod config;
mod error;
pub mod mode;
pub mod resolver;

pub use command::{headless_argv, interactive_argv, launch_line, shell_join, shell_quote};
pub use config::{
    ClaudeFlags, ExecutionMode, FileConfig, InteractiveSettings, OutputFormat, PtyStrategy,
    RunConfig, TmuxSettings,
};
pub use error::{EXIT_FAILURE, EXIT_SETUP, Error, Result};
pub use mode::{
    EffectiveMode, looks_like_slash_commands, prompt_queue, select_mode, split_prompt_lines,
};
pub use resolver::{BinaryResolver, ResolveStrategy, process_env};
