//! Tracing session lifecycle types.

use std::fmt;
use std::mem;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use crate::{ERR_POISONED_LOCK, TraceEvent};

/// Releases the backend resource of a session. Runs at most once.
type StopAction = Box<dyn FnOnce() + Send>;

enum SessionState {
    Active(StopAction),
    Stopped,
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active(_) => f.write_str("Active"),
            Self::Stopped => f.write_str("Stopped"),
        }
    }
}

/// Stops the session if it is still active. Stop from Stopped is a no-op,
/// and concurrent callers race safely: the state swap under the lock ensures
/// exactly one of them runs the stop action.
fn stop_state(state: &Mutex<SessionState>) {
    let mut guard = state.lock().expect(ERR_POISONED_LOCK);

    if let SessionState::Active(action) = mem::replace(&mut *guard, SessionState::Stopped) {
        action();
    }
}

/// A handle to one active session on the tracing backend.
///
/// The underlying resource outlives this process if leaked, so the session
/// must be stopped on every exit path. Stopping is idempotent: the normal
/// call path and an out-of-band teardown (via [`stop_handle()`](Self::stop_handle))
/// may race, at most one stop takes effect and later attempts do nothing.
#[derive(Debug)]
pub(crate) struct TraceSession {
    state: Arc<Mutex<SessionState>>,
    stop_on_drop: bool,
}

impl TraceSession {
    pub(crate) fn new(stop_on_drop: bool, stop_action: StopAction) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::Active(stop_action))),
            stop_on_drop,
        }
    }

    /// Stops the session and releases the backend resource.
    pub(crate) fn stop(&self) {
        stop_state(&self.state);
    }

    #[cfg(test)]
    pub(crate) fn is_stopped(&self) -> bool {
        matches!(
            *self.state.lock().expect(ERR_POISONED_LOCK),
            SessionState::Stopped
        )
    }

    /// A clonable handle that can stop this session from another thread,
    /// e.g. an interrupt handler.
    pub(crate) fn stop_handle(&self) -> SessionStopHandle {
        SessionStopHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Drop for TraceSession {
    fn drop(&mut self) {
        if self.stop_on_drop {
            self.stop();
        }
    }
}

/// Stops a [`TraceSession`] without owning it. Dropping the handle does not
/// stop the session.
#[derive(Clone, Debug)]
pub(crate) struct SessionStopHandle {
    state: Arc<Mutex<SessionState>>,
}

impl SessionStopHandle {
    pub(crate) fn stop(&self) {
        stop_state(&self.state);
    }
}

/// The live event stream of a session.
///
/// Blocks between events; ends once the session has been stopped and all
/// buffered events have been drained.
#[derive(Debug)]
pub(crate) struct EventStream {
    rx: mpsc::Receiver<TraceEvent>,
}

impl EventStream {
    pub(crate) fn new(rx: mpsc::Receiver<TraceEvent>) -> Self {
        Self { rx }
    }

    /// Blocks until the next event arrives, or returns `None` when the
    /// stream has ended.
    pub(crate) fn next_event(&mut self) -> Option<TraceEvent> {
        self.rx.recv().ok()
    }
}
