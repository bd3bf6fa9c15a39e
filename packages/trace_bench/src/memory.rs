//! Trace-correlated memory profiling.
//!
//! Wraps the timing harness's measurement loop with a concurrently running
//! consumer of the tracing facility's event stream, so that one run yields
//! both a throughput figure and the memory-management activity behind it.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::pal::{Platform, PlatformFacade};
use crate::session::{EventStream, SessionStopHandle};
use crate::{
    AllocationStat, ConsoleReporter, ERR_POISONED_LOCK, Reporter, SessionError, SessionOptions,
    Severity, TimedRun, TraceEvent,
};

/// Default settle period: how long the drain worker gets to attach to the
/// session before measurement starts. Events raised before attachment
/// completes would be lost, skewing the first iterations.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// The combined outcome of one memory-profiled run.
#[derive(Clone, Debug)]
pub struct MemoryRun {
    timed: TimedRun,
    stat: AllocationStat,
}

impl MemoryRun {
    /// The timing half of the run, in the same shape the timing harness
    /// produces.
    #[must_use]
    pub fn timed(&self) -> &TimedRun {
        &self.timed
    }

    /// The memory counters observed while the run was measured.
    #[must_use]
    pub fn stat(&self) -> &AllocationStat {
        &self.stat
    }
}

/// Measures wall-clock throughput while a background worker drains
/// memory-tracing events for this process from a dedicated tracing session.
///
/// The timing protocol is identical to [`Profiler`](crate::Profiler) - heap
/// normalization, one warm-up call, a tight measured loop - so the two
/// reports are directly comparable. On top of it, a session on the tracing
/// facility is opened for the duration of the measured window and exactly
/// one worker aggregates the allocation ticks and collection starts that
/// originate from this process.
///
/// Enabling the tracing provider is a privileged operation: when the check
/// fails, [`profile()`](Self::profile) reports a notice and returns without
/// measuring anything, so no misleading partial report can exist.
///
/// # Examples
///
/// ```no_run
/// use trace_bench::{Allocator, MemoryProfiler};
///
/// #[global_allocator]
/// static ALLOCATOR: Allocator<std::alloc::System> = Allocator::system();
///
/// fn main() {
///     let profiler = MemoryProfiler::new();
///     let outcome = profiler
///         .profile("build strings", 10_000, || {
///             let text = format!("{}-{}", 1, 2);
///             std::hint::black_box(&text);
///         })
///         .expect("tracing session could not be started");
/// }
/// ```
#[derive(Debug)]
pub struct MemoryProfiler {
    platform: PlatformFacade,
    reporter: Arc<dyn Reporter>,
    process_id: u32,
    session_name: String,
    settle_delay: Duration,
    active_session: Arc<Mutex<Option<SessionStopHandle>>>,
}

impl MemoryProfiler {
    /// Creates a memory profiler that reports to the console.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(PlatformFacade::real(), Arc::new(ConsoleReporter::new()))
    }

    /// Creates a memory profiler that reports through the given reporter.
    #[must_use]
    pub fn with_reporter(reporter: Arc<dyn Reporter>) -> Self {
        Self::with_parts(PlatformFacade::real(), reporter)
    }

    #[cfg(test)]
    pub(crate) fn with_platform(platform: PlatformFacade, reporter: Arc<dyn Reporter>) -> Self {
        Self::with_parts(platform, reporter)
    }

    fn with_parts(platform: PlatformFacade, reporter: Arc<dyn Reporter>) -> Self {
        let process_id = platform.process_id();

        // Sessions can outlive the process that created them, so the name
        // must be unique per concurrently profiled process and descriptive
        // enough to attribute a stale session to its creator.
        let session_name = format!("GC-{}_{process_id}", process_name());

        Self {
            platform,
            reporter,
            process_id,
            session_name,
            settle_delay: DEFAULT_SETTLE_DELAY,
            active_session: Arc::new(Mutex::new(None)),
        }
    }

    /// Replaces the settle delay.
    ///
    /// The default of [`DEFAULT_SETTLE_DELAY`] is generous; tests and
    /// short-lived candidates may shorten it at the risk of losing events
    /// from the first iterations.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// The unique name this profiler's tracing sessions are created under.
    #[must_use]
    pub fn session_name(&self) -> &str {
        &self.session_name
    }

    /// A handle that stops the currently active tracing session, intended
    /// to be wired into an interrupt handler: the session's backend resource
    /// outlives the process if leaked, so even an aborted run must release
    /// it. Safe to invoke from any thread, any number of times, racing the
    /// normal exit path.
    #[must_use]
    pub fn teardown_handle(&self) -> TeardownHandle {
        TeardownHandle {
            active_session: Arc::clone(&self.active_session),
        }
    }

    /// Profiles the candidate, correlating throughput with memory activity.
    ///
    /// Returns `Ok(None)` when the privilege check fails (a notice is
    /// reported and nothing is measured). Session-lifecycle failures are
    /// fatal for the call and propagate as [`SessionError`].
    pub fn profile(
        &self,
        label: &str,
        iterations: u64,
        mut action: impl FnMut(),
    ) -> Result<Option<MemoryRun>, SessionError> {
        if !self.platform.is_elevated() {
            self.reporter.line(
                Severity::Error,
                "Enabling memory tracing requires the tracking provider; install \
                 trace_bench::Allocator as the global allocator and run with sufficient privilege.",
            );
            return Ok(None);
        }

        if iterations == 0 {
            self.reporter.line(
                Severity::Warning,
                "0 iterations requested; throughput will be undefined",
            );
        }

        // Same heap-normalization and warm-up steps as the timing harness;
        // deviating here would invalidate comparison against its numbers.
        self.platform.collect_garbage();
        self.platform.wait_for_finalizers();
        self.platform.collect_garbage();
        action();

        let (session, stream) = self
            .platform
            .start_session(&self.session_name, SessionOptions::gc())?;

        // Expose the session to the out-of-band teardown path before any
        // long-running work begins.
        *self.active_session.lock().expect(ERR_POISONED_LOCK) = Some(session.stop_handle());

        let process_id = self.process_id;
        let worker = thread::Builder::new()
            .name("trace-drain".to_string())
            .spawn(move || drain_events(stream, process_id))
            .map_err(|error| SessionError::WorkerSpawn(error.to_string()))?;

        // Give the worker time to attach and begin receiving before the
        // measured window opens.
        thread::sleep(self.settle_delay);

        let started = Instant::now();
        for _ in 0..iterations {
            action();
        }
        let elapsed = started.elapsed();

        // Stopping closes the stream, which terminates the worker; joining
        // then hands the accumulated stat over. Single writer, then single
        // reader - no lock needed on the stat itself.
        session.stop();
        *self.active_session.lock().expect(ERR_POISONED_LOCK) = None;

        let stat = worker.join().expect("drain worker does not panic");

        let timed = TimedRun::new(label, iterations, iterations, elapsed);
        self.report(&timed, &stat);

        Ok(Some(MemoryRun { timed, stat }))
    }

    fn report(&self, timed: &TimedRun, stat: &AllocationStat) {
        self.reporter.line(
            Severity::Info,
            &format!("MemoryProfile via an action - {}", timed.label()),
        );
        self.reporter.line(Severity::Info, &timed.summary());
        self.reporter.line(
            Severity::Info,
            &format!(
                "Gen0 {}, Gen1 {}, Gen2 {}, {} bytes_allocated/op",
                stat.collections(0),
                stat.collections(1),
                stat.collections(2),
                stat.allocated_by_operation()
            ),
        );
    }
}

impl Default for MemoryProfiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Stops a [`MemoryProfiler`]'s active tracing session from outside the
/// normal call path, e.g. an interrupt handler.
///
/// The underlying teardown is idempotent: racing this handle against the
/// normal exit path stops the session exactly once, and invoking it with no
/// session active does nothing.
#[derive(Clone, Debug)]
pub struct TeardownHandle {
    active_session: Arc<Mutex<Option<SessionStopHandle>>>,
}

impl TeardownHandle {
    /// Stops the currently active session, if any.
    pub fn stop_active_session(&self) {
        if let Some(handle) = self
            .active_session
            .lock()
            .expect(ERR_POISONED_LOCK)
            .as_ref()
        {
            handle.stop();
        }
    }
}

/// Drains the session's live stream until it disconnects, aggregating events
/// that originate from this process. Sole writer of the stat; ownership
/// moves back to the caller through the thread's join handle.
fn drain_events(mut stream: EventStream, process_id: u32) -> AllocationStat {
    let mut stat = AllocationStat::new();

    while let Some(event) = stream.next_event() {
        match event {
            TraceEvent::AllocationTick {
                process_id: origin,
                bytes,
            } if origin == process_id => stat.record_tick(bytes),
            TraceEvent::CollectionStart {
                process_id: origin,
                generation,
                induced,
            } if origin == process_id => stat.record_collection(generation, induced),
            // Events from unrelated processes on the same machine.
            TraceEvent::AllocationTick { .. } | TraceEvent::CollectionStart { .. } => {}
        }
    }

    stat
}

fn process_name() -> String {
    std::env::current_exe()
        .ok()
        .and_then(|path| {
            path.file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "unknown".to_string())
}
