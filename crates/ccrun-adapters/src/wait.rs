//! Polling for expected text in a tmux window.

use crate::tmux::{CAPTURE_LINES, Multiplexer, TmuxSession};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Source of time for waits and pacing.
pub trait Pacer {
    fn now(&self) -> Instant;

    /// Blocks the calling thread for `duration`.
    fn sleep(&self, duration: Duration);
}

/// Wall-clock [`Pacer`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPacer;

impl Pacer for SystemPacer {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Polls the session until `pattern` appears as a literal substring of the
/// captured text, or `timeout` elapses.
///
/// Capture failures count as "not matched yet"; this never errors.
pub fn wait_for_text<M, P>(
    mux: &M,
    pacer: &P,
    session: &TmuxSession,
    pattern: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> bool
where
    M: Multiplexer + ?Sized,
    P: Pacer + ?Sized,
{
    let deadline = pacer.now() + timeout;
    while pacer.now() < deadline {
        match mux.capture(session, CAPTURE_LINES) {
            Ok(text) if text.contains(pattern) => {
                debug!(pattern, "Found expected text");
                return true;
            }
            Ok(_) => {}
            Err(err) => trace!(%err, "Capture failed while polling"),
        }
        pacer.sleep(poll_interval);
    }
    debug!(pattern, ?timeout, "Expected text did not appear");
    false
}
