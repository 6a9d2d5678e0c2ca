//! Run configuration and the optional YAML config file.
//!
//! A [`RunConfig`] is built once per invocation by the CLI (flags override the
//! config file, which overrides built-in defaults) and is then only read by
//! the headless and interactive strategies.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the tmux socket directory.
pub const SOCKET_DIR_ENV: &str = "OPENCLAW_TMUX_SOCKET_DIR";

/// Directory name used under the temp root when no socket dir is configured.
pub const DEFAULT_SOCKET_SUBDIR: &str = "openclaw-tmux-sockets";

pub const DEFAULT_SESSION_NAME: &str = "cc";
pub const DEFAULT_SOCKET_NAME: &str = "claude-code.sock";
pub const DEFAULT_TRUST_MARKER: &str = "Yes, I trust this folder";
pub const DEFAULT_WARNING_MARKER: &str = "warning";

/// Execution mode requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Interactive when the prompt contains slash commands, headless otherwise.
    #[default]
    Auto,
    Headless,
    Interactive,
}

/// Output format forwarded to the target program (headless only).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    StreamJson,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
            OutputFormat::StreamJson => "stream-json",
        }
    }
}

/// How headless runs obtain a pseudo-terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PtyStrategy {
    /// Use `script(1)` when it is on PATH, otherwise run directly.
    #[default]
    Auto,
    /// Allocate a PTY in-process.
    Native,
    /// Never emulate a terminal.
    Off,
}

/// Optional flags forwarded to the target program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaudeFlags {
    pub permission_mode: Option<String>,
    pub allowed_tools: Option<String>,
    pub output_format: Option<OutputFormat>,
    pub json_schema: Option<String>,
    pub append_system_prompt: Option<String>,
    pub system_prompt: Option<String>,
    pub continue_latest: bool,
    pub resume: Option<String>,
    /// Free-form trailing arguments, forwarded verbatim.
    pub extra: Vec<String>,
}

impl ClaudeFlags {
    /// Rejects flag values the target program would choke on.
    pub fn validate(&self) -> Result<()> {
        if let Some(schema) = &self.json_schema {
            serde_json::from_str::<serde_json::Value>(schema)
                .map_err(|e| Error::Config(format!("--json-schema is not valid JSON: {e}")))?;
        }
        Ok(())
    }
}

/// Where the tmux session lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TmuxSettings {
    pub session: String,
    pub socket_dir: Option<PathBuf>,
    pub socket_name: String,
}

impl Default for TmuxSettings {
    fn default() -> Self {
        Self {
            session: DEFAULT_SESSION_NAME.to_string(),
            socket_dir: None,
            socket_name: DEFAULT_SOCKET_NAME.to_string(),
        }
    }
}

impl TmuxSettings {
    /// Resolves the socket directory.
    ///
    /// Precedence: explicit setting > `OPENCLAW_TMUX_SOCKET_DIR` >
    /// `$TMPDIR/openclaw-tmux-sockets` (`/tmp` when `TMPDIR` is unset).
    /// Empty values at any level are treated as unset.
    pub fn socket_dir<F>(&self, env: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = self
            .socket_dir
            .as_ref()
            .filter(|dir| !dir.as_os_str().is_empty())
        {
            return dir.clone();
        }
        if let Some(dir) = env(SOCKET_DIR_ENV).filter(|v| !v.is_empty()) {
            return PathBuf::from(dir);
        }
        let tmp_root = env("TMPDIR")
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "/tmp".to_string());
        PathBuf::from(tmp_root).join(DEFAULT_SOCKET_SUBDIR)
    }

    /// Full path of the control socket.
    pub fn socket_path<F>(&self, env: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        self.socket_dir(env).join(&self.socket_name)
    }
}

/// Timing and marker knobs for the interactive driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractiveSettings {
    /// Sleep before the final snapshot; zero disables the snapshot.
    pub wait: Duration,
    /// Pause after each delivered prompt line.
    pub send_delay: Duration,
    pub poll_interval: Duration,
    pub trust_marker: String,
    pub trust_timeout: Duration,
    /// Pause between the first Enter on the trust prompt and the re-check.
    pub trust_settle: Duration,
    pub trust_recheck: Duration,
    pub warning_marker: String,
    pub warning_timeout: Duration,
}

impl Default for InteractiveSettings {
    fn default() -> Self {
        Self {
            wait: Duration::ZERO,
            send_delay: Duration::from_millis(800),
            poll_interval: Duration::from_millis(500),
            trust_marker: DEFAULT_TRUST_MARKER.to_string(),
            trust_timeout: Duration::from_secs(20),
            trust_settle: Duration::from_millis(800),
            trust_recheck: Duration::from_secs(2),
            warning_marker: DEFAULT_WARNING_MARKER.to_string(),
            warning_timeout: Duration::from_secs(5),
        }
    }
}

/// Everything one invocation needs, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Resolved path of the target binary.
    pub claude_bin: PathBuf,
    pub prompt: Option<String>,
    pub mode: ExecutionMode,
    pub flags: ClaudeFlags,
    pub cwd: Option<PathBuf>,
    pub pty: PtyStrategy,
    pub tmux: TmuxSettings,
    pub interactive: InteractiveSettings,
}

impl RunConfig {
    /// Creates a config with defaults for everything but the binary.
    pub fn new(claude_bin: impl Into<PathBuf>) -> Self {
        Self {
            claude_bin: claude_bin.into(),
            prompt: None,
            mode: ExecutionMode::Auto,
            flags: ClaudeFlags::default(),
            cwd: None,
            pty: PtyStrategy::Auto,
            tmux: TmuxSettings::default(),
            interactive: InteractiveSettings::default(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Config file
// ─────────────────────────────────────────────────────────────────────────────

/// Contents of the optional `ccrun.yml`. Every field is optional; unset
/// fields fall through to the built-in defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub claude_bin: Option<PathBuf>,
    pub headless: HeadlessFileConfig,
    pub tmux: TmuxFileConfig,
    pub interactive: InteractiveFileConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeadlessFileConfig {
    pub pty: Option<PtyStrategy>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TmuxFileConfig {
    pub session: Option<String>,
    pub socket_dir: Option<PathBuf>,
    pub socket_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InteractiveFileConfig {
    pub wait_secs: Option<u64>,
    pub send_delay_ms: Option<u64>,
    pub poll_interval_ms: Option<u64>,
    pub trust_marker: Option<String>,
    pub trust_timeout_ms: Option<u64>,
    pub trust_settle_ms: Option<u64>,
    pub trust_recheck_ms: Option<u64>,
    pub warning_marker: Option<String>,
    pub warning_timeout_ms: Option<u64>,
}

impl FileConfig {
    /// Loads the config file at `path`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_yaml(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Loads the config file if it exists, defaults otherwise.
    pub fn load_optional(path: &Path) -> Result<Self> {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            Self::from_file(path)
        } else {
            tracing::debug!("Config file {} not found, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Parses YAML content. An empty document yields the defaults.
    pub fn parse_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Tmux settings with file values layered over the defaults.
    pub fn tmux_settings(&self) -> TmuxSettings {
        let defaults = TmuxSettings::default();
        TmuxSettings {
            session: self.tmux.session.clone().unwrap_or(defaults.session),
            socket_dir: self.tmux.socket_dir.clone(),
            socket_name: self.tmux.socket_name.clone().unwrap_or(defaults.socket_name),
        }
    }

    /// Interactive settings with file values layered over the defaults.
    pub fn interactive_settings(&self) -> InteractiveSettings {
        let mut settings = InteractiveSettings::default();
        let file = &self.interactive;
        let millis = Duration::from_millis;

        if let Some(secs) = file.wait_secs {
            settings.wait = Duration::from_secs(secs);
        }
        if let Some(ms) = file.send_delay_ms {
            settings.send_delay = millis(ms);
        }
        if let Some(ms) = file.poll_interval_ms {
            settings.poll_interval = millis(ms);
        }
        if let Some(marker) = &file.trust_marker {
            settings.trust_marker.clone_from(marker);
        }
        if let Some(ms) = file.trust_timeout_ms {
            settings.trust_timeout = millis(ms);
        }
        if let Some(ms) = file.trust_settle_ms {
            settings.trust_settle = millis(ms);
        }
        if let Some(ms) = file.trust_recheck_ms {
            settings.trust_recheck = millis(ms);
        }
        if let Some(marker) = &file.warning_marker {
            settings.warning_marker.clone_from(marker);
        }
        if let Some(ms) = file.warning_timeout_ms {
            settings.warning_timeout = millis(ms);
        }
        settings
    }
}
