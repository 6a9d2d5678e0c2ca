//! Interactive session driver.
//!
//! Steers the target program inside a detached tmux session: create the
//! session, launch the program, get past the start-up prompts, type the
//! prompt lines, then tell the operator how to watch. The session is left
//! running when the driver finishes.
//!
//! ```text
//! Init -> SessionCreated -> ProgramLaunched -> TrustHandled -> WarningHandled
//!      -> PromptDelivered -> [SnapshotTaken] -> Done
//! ```

use crate::tmux::{CAPTURE_LINES, Multiplexer, TmuxSession};
use crate::wait::{Pacer, wait_for_text};
use ccrun_core::{InteractiveSettings, Result, prompt_queue, shell_quote};
use std::io::Write;
use tracing::{debug, info, warn};

/// Driver progress. Each state has exactly one handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Init,
    SessionCreated,
    ProgramLaunched,
    TrustHandled,
    WarningHandled,
    PromptDelivered,
    SnapshotTaken,
    Done,
}

/// Runs one interactive session to completion.
pub struct SessionDriver<M, P> {
    mux: M,
    pacer: P,
    session: TmuxSession,
    launch_line: String,
    prompt: Option<String>,
    settings: InteractiveSettings,
}

impl<M: Multiplexer, P: Pacer> SessionDriver<M, P> {
    /// `launch_line` is typed verbatim into the session's shell.
    pub fn new(
        mux: M,
        pacer: P,
        session: TmuxSession,
        launch_line: impl Into<String>,
        settings: InteractiveSettings,
    ) -> Self {
        Self {
            mux,
            pacer,
            session,
            launch_line: launch_line.into(),
            prompt: None,
            settings,
        }
    }

    #[must_use]
    pub fn with_prompt(mut self, prompt: Option<String>) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn session(&self) -> &TmuxSession {
        &self.session
    }

    /// Drives every state until [`DriverState::Done`]. Operator text goes
    /// to `out`.
    pub fn run(&self, out: &mut dyn Write) -> Result<i32> {
        let mut state = DriverState::Init;
        while state != DriverState::Done {
            let next = self.step(state, out)?;
            debug!(from = ?state, to = ?next, "Driver transition");
            state = next;
        }
        Ok(0)
    }

    /// Runs the handler for `state` and returns the next state.
    pub fn step(&self, state: DriverState, out: &mut dyn Write) -> Result<DriverState> {
        match state {
            DriverState::Init => {
                self.create_session()?;
                Ok(DriverState::SessionCreated)
            }
            DriverState::SessionCreated => {
                self.launch_program()?;
                Ok(DriverState::ProgramLaunched)
            }
            DriverState::ProgramLaunched => {
                self.handle_trust_prompt();
                Ok(DriverState::TrustHandled)
            }
            DriverState::TrustHandled => {
                self.handle_warning_banner();
                Ok(DriverState::WarningHandled)
            }
            DriverState::WarningHandled => {
                self.deliver_prompt()?;
                Ok(DriverState::PromptDelivered)
            }
            DriverState::PromptDelivered => {
                self.report(out)?;
                if self.settings.wait.is_zero() {
                    Ok(DriverState::Done)
                } else {
                    self.snapshot(out)?;
                    Ok(DriverState::SnapshotTaken)
                }
            }
            DriverState::SnapshotTaken | DriverState::Done => Ok(DriverState::Done),
        }
    }

    fn create_session(&self) -> Result<()> {
        if let Some(dir) = self.session.socket().parent() {
            std::fs::create_dir_all(dir)?;
        }
        // Same-named sessions are replaced; the newest run wins.
        self.mux.kill_session(&self.session);
        self.mux.new_session(&self.session)?;
        info!(
            session = self.session.name(),
            socket = %self.session.socket().display(),
            "Created tmux session"
        );
        Ok(())
    }

    fn launch_program(&self) -> Result<()> {
        debug!(line = %self.launch_line, "Launching program");
        self.mux.send_literal(&self.session, &self.launch_line)?;
        self.mux.send_enter(&self.session)
    }

    fn wait_for(&self, pattern: &str, timeout: std::time::Duration) -> bool {
        wait_for_text(
            &self.mux,
            &self.pacer,
            &self.session,
            pattern,
            timeout,
            self.settings.poll_interval,
        )
    }

    fn handle_trust_prompt(&self) {
        let settings = &self.settings;
        if !self.wait_for(&settings.trust_marker, settings.trust_timeout) {
            return;
        }
        info!("Accepting workspace trust prompt");
        self.press_enter("trust prompt");
        self.pacer.sleep(settings.trust_settle);

        // Enter did not take; pick the first menu entry explicitly.
        if self.wait_for(&settings.trust_marker, settings.trust_recheck) {
            debug!("Trust prompt still showing, selecting option 1");
            if let Err(err) = self.mux.send_literal(&self.session, "1") {
                warn!(%err, "Failed to select trust option");
            }
            self.press_enter("trust prompt");
        }
    }

    fn handle_warning_banner(&self) {
        let settings = &self.settings;
        if self.wait_for(&settings.warning_marker, settings.warning_timeout) {
            info!("Dismissing warning banner");
            self.press_enter("warning banner");
        }
    }

    fn press_enter(&self, what: &str) {
        if let Err(err) = self.mux.send_enter(&self.session) {
            warn!(%err, "Failed to dismiss {what}");
        }
    }

    fn deliver_prompt(&self) -> Result<()> {
        let Some(prompt) = self.prompt.as_deref() else {
            return Ok(());
        };
        let lines = prompt_queue(prompt);
        info!(count = lines.len(), "Delivering prompt lines");
        for line in lines {
            debug!(line, "Sending prompt line");
            self.mux.send_literal(&self.session, line)?;
            self.mux.send_enter(&self.session)?;
            self.pacer.sleep(self.settings.send_delay);
        }
        Ok(())
    }

    fn report(&self, out: &mut dyn Write) -> Result<()> {
        let socket = shell_quote(&self.session.socket().to_string_lossy())?;
        let name = shell_quote(self.session.name())?;
        let target = shell_quote(&self.session.target())?;

        writeln!(out, "Started interactive Claude Code in tmux.")?;
        writeln!(out, "To monitor:")?;
        writeln!(out, "  tmux -S {socket} attach -t {name}")?;
        writeln!(out, "To snapshot output:")?;
        writeln!(
            out,
            "  tmux -S {socket} capture-pane -p -J -t {target} -S -{CAPTURE_LINES}"
        )?;
        Ok(())
    }

    fn snapshot(&self, out: &mut dyn Write) -> Result<()> {
        self.pacer.sleep(self.settings.wait);
        match self.mux.capture(&self.session, CAPTURE_LINES) {
            Ok(snap) => {
                writeln!(out, "\n--- tmux snapshot (last {CAPTURE_LINES} lines) ---\n")?;
                writeln!(out, "{snap}")?;
            }
            Err(err) => debug!(%err, "Snapshot capture failed, omitting"),
        }
        Ok(())
    }
}
