//! Fake tracing backend for testing.

use std::sync::{Arc, Mutex, mpsc};

use crate::pal::abstractions::Platform;
use crate::session::{EventStream, TraceSession};
use crate::{ERR_POISONED_LOCK, GENERATION_COUNT, SessionError, SessionOptions, TraceEvent};

#[derive(Debug)]
struct FakeSessionEntry {
    name: String,
    tx: mpsc::Sender<TraceEvent>,
}

/// Internal state shared between clones of the fake platform.
#[derive(Debug)]
struct FakeState {
    elevated: bool,
    process_id: u32,
    next_session_error: Option<SessionError>,
    sessions: Vec<FakeSessionEntry>,
    opened_names: Vec<String>,
    options_seen: Vec<SessionOptions>,
    collect_calls: u64,
    finalizer_waits: u64,
}

/// Scripted implementation of the tracing facility for tests.
///
/// Clones share state, so a test can keep one clone for scripting and event
/// injection while the profiler under test uses the other.
#[derive(Clone, Debug)]
pub(crate) struct FakePlatform {
    state: Arc<Mutex<FakeState>>,
}

impl FakePlatform {
    /// Creates a fake platform that is elevated and owns process id 1234.
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                elevated: true,
                process_id: 1234,
                next_session_error: None,
                sessions: Vec::new(),
                opened_names: Vec::new(),
                options_seen: Vec::new(),
                collect_calls: 0,
                finalizer_waits: 0,
            })),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().expect(ERR_POISONED_LOCK)
    }

    /// Controls the outcome of the privilege check.
    pub(crate) fn set_elevated(&self, elevated: bool) {
        self.state().elevated = elevated;
    }

    /// Overrides the process id the platform reports as its own.
    pub(crate) fn set_process_id(&self, process_id: u32) {
        self.state().process_id = process_id;
    }

    /// Makes the next session start fail with the given error.
    pub(crate) fn fail_next_session(&self, error: SessionError) {
        self.state().next_session_error = Some(error);
    }

    /// Delivers an event to every open session.
    pub(crate) fn inject_event(&self, event: TraceEvent) {
        let state = self.state();
        for entry in &state.sessions {
            _ = entry.tx.send(event);
        }
    }

    /// Names of all sessions that were ever opened, in order.
    pub(crate) fn opened_names(&self) -> Vec<String> {
        self.state().opened_names.clone()
    }

    /// Options of the most recently opened session.
    pub(crate) fn last_options(&self) -> Option<SessionOptions> {
        self.state().options_seen.last().copied()
    }

    /// How many collection cycles were requested.
    pub(crate) fn collect_calls(&self) -> u64 {
        self.state().collect_calls
    }

    /// How many finalizer waits were requested.
    pub(crate) fn finalizer_waits(&self) -> u64 {
        self.state().finalizer_waits
    }

    /// Whether any session is currently open.
    pub(crate) fn has_open_session(&self) -> bool {
        !self.state().sessions.is_empty()
    }
}

impl Platform for FakePlatform {
    fn is_elevated(&self) -> bool {
        self.state().elevated
    }

    fn process_id(&self) -> u32 {
        self.state().process_id
    }

    fn collect_garbage(&self) {
        let mut state = self.state();
        state.collect_calls = state.collect_calls.wrapping_add(1);

        // Mirror the real platform: an induced full-depth cycle is announced
        // to any session that happens to be open.
        let event = TraceEvent::CollectionStart {
            process_id: state.process_id,
            generation: GENERATION_COUNT - 1,
            induced: true,
        };
        for entry in &state.sessions {
            _ = entry.tx.send(event);
        }
    }

    fn wait_for_finalizers(&self) {
        let mut state = self.state();
        state.finalizer_waits = state.finalizer_waits.wrapping_add(1);
    }

    fn start_session(
        &self,
        name: &str,
        options: SessionOptions,
    ) -> Result<(TraceSession, EventStream), SessionError> {
        let mut state = self.state();

        if let Some(error) = state.next_session_error.take() {
            return Err(error);
        }

        if state.sessions.iter().any(|entry| entry.name == name) {
            return Err(SessionError::NameInUse(name.to_string()));
        }

        let (tx, rx) = mpsc::channel();
        state.sessions.push(FakeSessionEntry {
            name: name.to_string(),
            tx,
        });
        state.opened_names.push(name.to_string());
        state.options_seen.push(options);

        let stop_state = Arc::clone(&self.state);
        let stop_name = name.to_string();
        let session = TraceSession::new(
            options.stop_on_drop,
            Box::new(move || {
                let mut state = stop_state.lock().expect(ERR_POISONED_LOCK);
                if let Some(index) = state
                    .sessions
                    .iter()
                    .position(|entry| entry.name == stop_name)
                {
                    drop(state.sessions.remove(index));
                }
            }),
        );

        Ok((session, EventStream::new(rx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_names_are_refused_while_active() {
        let platform = FakePlatform::new();

        let (session, _stream) = platform
            .start_session("dup", SessionOptions::gc())
            .expect("first session starts");

        assert_eq!(
            platform
                .start_session("dup", SessionOptions::gc())
                .expect_err("duplicate name is refused"),
            SessionError::NameInUse("dup".to_string())
        );

        session.stop();
        assert!(!platform.has_open_session());

        let (session, _stream) = platform
            .start_session("dup", SessionOptions::gc())
            .expect("name is reusable after stop");
        session.stop();
    }

    #[test]
    fn scripted_failure_fires_once() {
        let platform = FakePlatform::new();
        platform.fail_next_session(SessionError::BackendUnavailable("scripted".to_string()));

        assert_eq!(
            platform
                .start_session("scripted", SessionOptions::gc())
                .expect_err("scripted failure surfaces"),
            SessionError::BackendUnavailable("scripted".to_string())
        );

        let (session, _stream) = platform
            .start_session("scripted", SessionOptions::gc())
            .expect("failure script is consumed");
        session.stop();
    }

    #[test]
    fn injected_events_reach_the_stream() {
        let platform = FakePlatform::new();
        let (session, mut stream) = platform
            .start_session("inject", SessionOptions::gc())
            .expect("session starts");

        let event = TraceEvent::AllocationTick {
            process_id: 1234,
            bytes: 4096,
        };
        platform.inject_event(event);
        session.stop();

        assert_eq!(stream.next_event(), Some(event));
        assert_eq!(stream.next_event(), None);
    }

    #[test]
    fn collect_garbage_is_counted_and_announced() {
        let platform = FakePlatform::new();
        let (session, mut stream) = platform
            .start_session("collect", SessionOptions::gc())
            .expect("session starts");

        platform.collect_garbage();
        platform.wait_for_finalizers();
        session.stop();

        assert_eq!(platform.collect_calls(), 1);
        assert_eq!(platform.finalizer_waits(), 1);
        assert_eq!(
            stream.next_event(),
            Some(TraceEvent::CollectionStart {
                process_id: 1234,
                generation: GENERATION_COUNT - 1,
                induced: true,
            })
        );
    }

    static_assertions::assert_impl_all!(FakePlatform: Send, Sync);
}
