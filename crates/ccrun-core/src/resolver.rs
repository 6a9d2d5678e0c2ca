//! Executable discovery.
//!
//! A [`BinaryResolver`] is an ordered list of strategies tried in sequence;
//! the first one that yields a path wins. Environment access goes through a
//! lookup closure so resolution is deterministic under test.

use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable forcing the claude binary location.
pub const CLAUDE_BIN_ENV: &str = "CLAUDE_CODE_BIN";

/// Well-known install locations checked after the search path.
pub const CLAUDE_CANDIDATES: &[&str] = &[
    "/home/linuxbrew/.linuxbrew/bin/claude",
    "~/.local/bin/claude",
    "/usr/local/bin/claude",
];

/// One way of finding an executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveStrategy {
    /// A path supplied by the operator, used as-is.
    Explicit(PathBuf),
    /// A non-empty environment variable, used as-is.
    EnvVar(&'static str),
    /// A program name looked up on `PATH`.
    SearchPath(&'static str),
    /// Fixed locations that must be executable files. `~/` expands to `$HOME`.
    Candidates(Vec<PathBuf>),
}

/// Ordered resolution strategies.
#[derive(Debug, Clone, Default)]
pub struct BinaryResolver {
    strategies: Vec<ResolveStrategy>,
}

impl BinaryResolver {
    pub fn new(strategies: Vec<ResolveStrategy>) -> Self {
        Self { strategies }
    }

    /// Resolver for the claude binary.
    ///
    /// Precedence: explicit path > `CLAUDE_CODE_BIN` > `PATH` > well-known
    /// install locations.
    pub fn claude(explicit: Option<PathBuf>) -> Self {
        let mut strategies = Vec::new();
        if let Some(path) = explicit {
            strategies.push(ResolveStrategy::Explicit(path));
        }
        strategies.push(ResolveStrategy::EnvVar(CLAUDE_BIN_ENV));
        strategies.push(ResolveStrategy::SearchPath("claude"));
        strategies.push(ResolveStrategy::Candidates(
            CLAUDE_CANDIDATES.iter().map(PathBuf::from).collect(),
        ));
        Self::new(strategies)
    }

    /// Resolver that only consults `PATH` (used for `tmux` and `script`).
    pub fn program(name: &'static str) -> Self {
        Self::new(vec![ResolveStrategy::SearchPath(name)])
    }

    pub fn strategies(&self) -> &[ResolveStrategy] {
        &self.strategies
    }

    /// Returns the first path any strategy produces, or `None`.
    pub fn resolve<F>(&self, env: F) -> Option<PathBuf>
    where
        F: Fn(&str) -> Option<String>,
    {
        self.strategies.iter().find_map(|strategy| {
            let found = try_strategy(strategy, &env);
            if let Some(path) = &found {
                debug!(?strategy, path = %path.display(), "Resolved executable");
            }
            found
        })
    }
}

fn try_strategy<F>(strategy: &ResolveStrategy, env: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    match strategy {
        ResolveStrategy::Explicit(path) => Some(path.clone()),
        ResolveStrategy::EnvVar(key) => env(*key).filter(|v| !v.is_empty()).map(PathBuf::from),
        ResolveStrategy::SearchPath(name) => {
            let path_var = env("PATH")?;
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            which::which_in(*name, Some(path_var), cwd).ok()
        }
        ResolveStrategy::Candidates(paths) => paths
            .iter()
            .filter_map(|candidate| expand_home(candidate, env))
            .find(|candidate| is_executable_file(candidate)),
    }
}

fn expand_home<F>(path: &Path, env: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    match path.strip_prefix("~") {
        Ok(rest) => env("HOME").map(|home| PathBuf::from(home).join(rest)),
        Err(_) => Some(path.to_path_buf()),
    }
}

#[cfg(unix)]
fn is_executable_file(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable_file(path: &Path) -> bool {
    path.is_file()
}

/// Environment lookup backed by the real process environment.
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
