//! The real tracing backend: an in-process provider fed by the tracking
//! allocator and by collector-aware hosts.
//!
//! Sessions are registered machine-visibly by name in a process-global
//! registry. Events published by the provider are broadcast to every active
//! session; each session's stream is closed when the session is stopped.

use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{LazyLock, Mutex, mpsc};

use crate::pal::abstractions::Platform;
use crate::session::{EventStream, TraceSession};
use crate::{ERR_POISONED_LOCK, GENERATION_COUNT, SessionError, SessionOptions, TraceEvent};

/// One allocation-tick event is published for every quantum of bytes a
/// thread accumulates, mirroring the tick granularity of the facility this
/// provider stands in for.
pub(crate) const TICK_QUANTUM_BYTES: u64 = 100 * 1024;

/// Set once the tracking allocator has served an allocation, proving the
/// provider is installed in this process.
static PROVIDER_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Count of currently active sessions. Lets the allocation hot path bail
/// with a single relaxed load when nobody is listening.
static ACTIVE_SESSIONS: AtomicUsize = AtomicUsize::new(0);

#[derive(Debug)]
struct SessionEntry {
    name: String,
    tx: mpsc::Sender<TraceEvent>,
}

static SESSIONS: LazyLock<Mutex<Vec<SessionEntry>>> = LazyLock::new(|| Mutex::new(Vec::new()));

thread_local! {
    /// Bytes allocated by this thread since its last published tick.
    static PENDING_TICK_BYTES: Cell<u64> = const { Cell::new(0) };

    /// Guards against allocator re-entry: publishing an event and touching
    /// the session registry both allocate, and the registry lock is not
    /// reentrant.
    static PUBLISH_GUARD: Cell<bool> = const { Cell::new(false) };
}

/// Runs `f` with the publish guard held, so any allocation it performs is
/// exempt from tick accounting on this thread.
fn with_publish_guard<R>(f: impl FnOnce() -> R) -> R {
    PUBLISH_GUARD.with(|guard| {
        let previous = guard.replace(true);
        let result = f();
        guard.set(previous);
        result
    })
}

/// Sends an event to every active session.
///
/// Callers must hold the publish guard.
fn broadcast(event: TraceEvent) {
    let sessions = SESSIONS.lock().expect(ERR_POISONED_LOCK);
    for entry in sessions.iter() {
        // A failed send means the session is mid-teardown; nothing to do.
        _ = entry.tx.send(event);
    }
}

/// Called by the tracking allocator on every allocation it serves.
///
/// Accumulates per-thread pending bytes and publishes one allocation tick
/// per [`TICK_QUANTUM_BYTES`] accumulated while at least one session is
/// active. Bytes pending when the last session stops are carried into the
/// first tick of the next session; the residue is below one quantum.
pub(crate) fn on_allocation(size: usize) {
    if !PROVIDER_INSTALLED.load(Ordering::Relaxed) {
        PROVIDER_INSTALLED.store(true, Ordering::Relaxed);
    }

    if ACTIVE_SESSIONS.load(Ordering::Relaxed) == 0 {
        return;
    }

    let size: u64 = size.try_into().expect("usize always fits into u64");

    PUBLISH_GUARD.with(|guard| {
        if guard.get() {
            return;
        }

        PENDING_TICK_BYTES.with(|pending| {
            let accumulated = pending.get().wrapping_add(size);
            if accumulated < TICK_QUANTUM_BYTES {
                pending.set(accumulated);
                return;
            }

            pending.set(0);
            guard.set(true);
            broadcast(TraceEvent::AllocationTick {
                process_id: std::process::id(),
                bytes: accumulated,
            });
            guard.set(false);
        });
    });
}

/// Publishes a collection-start event for the current process to every
/// active tracing session.
///
/// Collector-aware hosts call this when a collection cycle begins.
/// `generation` is the depth of the cycle (0 is the youngest generation);
/// `induced` marks cycles explicitly requested by program code, which
/// profilers exclude from their counters.
pub fn publish_collection(generation: usize, induced: bool) {
    if ACTIVE_SESSIONS.load(Ordering::Relaxed) == 0 {
        return;
    }

    with_publish_guard(|| {
        broadcast(TraceEvent::CollectionStart {
            process_id: std::process::id(),
            generation,
            induced,
        });
    });
}

fn unregister_session(name: &str) {
    with_publish_guard(|| {
        let mut sessions = SESSIONS.lock().expect(ERR_POISONED_LOCK);
        if let Some(index) = sessions.iter().position(|entry| entry.name == name) {
            // Dropping the sender disconnects the session's stream.
            drop(sessions.remove(index));
            ACTIVE_SESSIONS.fetch_sub(1, Ordering::Relaxed);
        }
    });
}

/// The real tracing facility.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct RealPlatform;

impl RealPlatform {
    pub(crate) const fn new() -> Self {
        Self
    }
}

impl Platform for RealPlatform {
    fn is_elevated(&self) -> bool {
        // Enabling tracing requires the provider to be installed; without
        // the tracking allocator in place there is nothing to stream.
        PROVIDER_INSTALLED.load(Ordering::Relaxed)
    }

    fn process_id(&self) -> u32 {
        std::process::id()
    }

    fn collect_garbage(&self) {
        // A plain Rust process has no tracked collector to run. Announce the
        // induced full-depth cycle so event consumers observe the same shape
        // a collector-aware host would produce.
        publish_collection(GENERATION_COUNT - 1, true);
    }

    fn wait_for_finalizers(&self) {
        // Finalization is synchronous in this process model (drops run
        // inline), so there is never outstanding finalizer work to wait for.
    }

    fn start_session(
        &self,
        name: &str,
        options: SessionOptions,
    ) -> Result<(TraceSession, EventStream), SessionError> {
        let (tx, rx) = mpsc::channel();

        with_publish_guard(|| {
            let mut sessions = SESSIONS.lock().expect(ERR_POISONED_LOCK);
            if sessions.iter().any(|entry| entry.name == name) {
                return Err(SessionError::NameInUse(name.to_string()));
            }

            sessions.push(SessionEntry {
                name: name.to_string(),
                tx,
            });
            ACTIVE_SESSIONS.fetch_add(1, Ordering::Relaxed);
            Ok(())
        })?;

        let registered_name = name.to_string();
        let session = TraceSession::new(
            options.stop_on_drop,
            Box::new(move || unregister_session(&registered_name)),
        );

        Ok((session, EventStream::new(rx)))
    }
}
