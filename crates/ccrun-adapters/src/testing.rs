//! Scripted doubles for the tmux seam and the clock.
//!
//! Both doubles are cheap to clone and share state, so a test can hand one
//! copy to the code under test and inspect another afterwards.

use crate::tmux::{Multiplexer, TmuxSession};
use crate::wait::Pacer;
use ccrun_core::{Error, Result};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// One call observed by [`FakeMultiplexer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MuxCall {
    NewSession(String),
    KillSession(String),
    SendLiteral(String),
    SendEnter,
    Capture(usize),
}

/// In-memory [`Multiplexer`] with scripted captures.
///
/// Captures are served from a queue first; once it is empty every capture
/// returns the current screen.
#[derive(Debug, Clone, Default)]
pub struct FakeMultiplexer {
    state: Arc<Mutex<MuxState>>,
}

#[derive(Debug, Default)]
struct MuxState {
    live: BTreeSet<String>,
    generations: BTreeMap<String, u32>,
    calls: Vec<MuxCall>,
    captures: VecDeque<Option<String>>,
    screen: String,
    fail_captures: bool,
    fail_new_session: bool,
    fail_send_literal: bool,
}

impl FakeMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MuxState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues the text returned by the next unscripted capture.
    pub fn push_capture(&self, text: impl Into<String>) {
        self.state().captures.push_back(Some(text.into()));
    }

    /// Queues a failing capture.
    pub fn push_capture_error(&self) {
        self.state().captures.push_back(None);
    }

    /// Sets the text returned once the capture queue is drained.
    pub fn set_screen(&self, text: impl Into<String>) {
        self.state().screen = text.into();
    }

    /// Makes every capture fail.
    pub fn fail_all_captures(&self) {
        self.state().fail_captures = true;
    }

    pub fn fail_new_session(&self) {
        self.state().fail_new_session = true;
    }

    pub fn fail_send_literal(&self) {
        self.state().fail_send_literal = true;
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<MuxCall> {
        self.state().calls.clone()
    }

    /// Text typed with [`Multiplexer::send_literal`], in order.
    pub fn typed(&self) -> Vec<String> {
        self.state()
            .calls
            .iter()
            .filter_map(|call| match call {
                MuxCall::SendLiteral(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn enter_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|call| **call == MuxCall::SendEnter)
            .count()
    }

    /// How many times a session with this name has been created.
    pub fn session_generation(&self, name: &str) -> u32 {
        self.state().generations.get(name).copied().unwrap_or(0)
    }

    pub fn is_live(&self, name: &str) -> bool {
        self.state().live.contains(name)
    }
}

fn fake_failure(action: &str) -> Error {
    Error::Tmux {
        action: action.to_string(),
        detail: "scripted failure".to_string(),
    }
}

impl Multiplexer for FakeMultiplexer {
    fn new_session(&self, session: &TmuxSession) -> Result<()> {
        let mut state = self.state();
        state.calls.push(MuxCall::NewSession(session.name().to_string()));
        if state.fail_new_session {
            return Err(fake_failure("new-session"));
        }
        if !state.live.insert(session.name().to_string()) {
            return Err(Error::Tmux {
                action: "new-session".to_string(),
                detail: format!("duplicate session: {}", session.name()),
            });
        }
        *state
            .generations
            .entry(session.name().to_string())
            .or_default() += 1;
        Ok(())
    }

    fn kill_session(&self, session: &TmuxSession) {
        let mut state = self.state();
        state.calls.push(MuxCall::KillSession(session.name().to_string()));
        state.live.remove(session.name());
    }

    fn send_literal(&self, _session: &TmuxSession, text: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(MuxCall::SendLiteral(text.to_string()));
        if state.fail_send_literal {
            return Err(fake_failure("send-keys"));
        }
        Ok(())
    }

    fn send_enter(&self, _session: &TmuxSession) -> Result<()> {
        self.state().calls.push(MuxCall::SendEnter);
        Ok(())
    }

    fn capture(&self, _session: &TmuxSession, lines: usize) -> Result<String> {
        let mut state = self.state();
        state.calls.push(MuxCall::Capture(lines));
        if state.fail_captures {
            return Err(fake_failure("capture-pane"));
        }
        match state.captures.pop_front() {
            Some(Some(text)) => Ok(text),
            Some(None) => Err(fake_failure("capture-pane")),
            None => Ok(state.screen.clone()),
        }
    }
}

/// Virtual clock: `sleep` advances time instantly and is recorded.
#[derive(Debug, Clone)]
pub struct FakePacer {
    start: Instant,
    state: Arc<Mutex<PacerState>>,
}

#[derive(Debug, Default)]
struct PacerState {
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

impl FakePacer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            state: Arc::default(),
        }
    }

    fn state(&self) -> MutexGuard<'_, PacerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Total virtual time slept.
    pub fn elapsed(&self) -> Duration {
        self.state().elapsed
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.state().sleeps.clone()
    }
}

impl Default for FakePacer {
    fn default() -> Self {
        Self::new()
    }
}

impl Pacer for FakePacer {
    fn now(&self) -> Instant {
        self.start + self.state().elapsed
    }

    fn sleep(&self, duration: Duration) {
        let mut state = self.state();
        state.elapsed += duration;
        state.sleeps.push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_drain_queue_then_show_screen() {
        let mux = FakeMultiplexer::new();
        let session = TmuxSession::new("/tmp/s", "cc");
        mux.push_capture("first");
        mux.push_capture_error();
        mux.set_screen("steady");

        assert_eq!(mux.capture(&session, 200).unwrap(), "first");
        assert!(mux.capture(&session, 200).is_err());
        assert_eq!(mux.capture(&session, 200).unwrap(), "steady");
        assert_eq!(mux.capture(&session, 200).unwrap(), "steady");
    }

    #[test]
    fn duplicate_session_is_rejected_until_killed() {
        let mux = FakeMultiplexer::new();
        let session = TmuxSession::new("/tmp/s", "cc");

        mux.new_session(&session).unwrap();
        assert!(mux.new_session(&session).is_err());

        mux.kill_session(&session);
        assert!(!mux.is_live("cc"));
        mux.new_session(&session).unwrap();
        assert_eq!(mux.session_generation("cc"), 2);
    }

    #[test]
    fn clones_share_recorded_calls() {
        let mux = FakeMultiplexer::new();
        let observer = mux.clone();
        let session = TmuxSession::new("/tmp/s", "cc");

        mux.send_literal(&session, "/compact").unwrap();
        mux.send_enter(&session).unwrap();

        assert_eq!(observer.typed(), vec!["/compact"]);
        assert_eq!(observer.enter_count(), 1);
    }

    #[test]
    fn pacer_advances_virtual_time() {
        let pacer = FakePacer::new();
        let before = pacer.now();
        pacer.sleep(Duration::from_millis(800));
        pacer.sleep(Duration::from_secs(2));

        assert_eq!(pacer.now() - before, Duration::from_millis(2800));
        assert_eq!(
            pacer.sleeps(),
            vec![Duration::from_millis(800), Duration::from_secs(2)]
        );
    }
}
