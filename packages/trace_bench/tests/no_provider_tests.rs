//! Integration tests for `trace_bench` without the tracing provider.
//!
//! This binary deliberately does not install the tracking allocator, so the
//! privilege check fails and memory profiling must decline to measure while
//! plain timing keeps working.

use std::hint::black_box;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use trace_bench::{MemoryProfiler, Profiler, Reporter, Severity};

/// Records every reported line so assertions can inspect them.
#[derive(Debug, Default)]
struct RecordingReporter {
    lines: Mutex<Vec<(Severity, String)>>,
}

impl RecordingReporter {
    fn contains(&self, severity: Severity, fragment: &str) -> bool {
        self.lines
            .lock()
            .expect("lines lock poisoned")
            .iter()
            .any(|(tag, text)| *tag == severity && text.contains(fragment))
    }
}

impl Reporter for RecordingReporter {
    fn line(&self, severity: Severity, text: &str) {
        self.lines
            .lock()
            .expect("lines lock poisoned")
            .push((severity, text.to_string()));
    }
}

#[test]
fn memory_profiling_declines_without_the_provider() {
    let reporter = Arc::new(RecordingReporter::default());
    let profiler = MemoryProfiler::with_reporter(Arc::clone(&reporter) as Arc<dyn Reporter>)
        .with_settle_delay(Duration::from_millis(1));

    let calls = AtomicU64::new(0);
    let outcome = profiler
        .profile("unobservable", 100, || {
            calls.fetch_add(1, Ordering::Relaxed);
        })
        .expect("a failed privilege check is not an error");

    assert!(outcome.is_none());
    assert_eq!(calls.load(Ordering::Relaxed), 0, "nothing may run, not even warm-up");
    assert!(reporter.contains(Severity::Error, "privilege"));
}

#[test]
fn timing_still_works_without_the_provider() {
    let profiler = Profiler::new();

    let run = profiler.profile_consume("square root", 10_000, || {
        black_box(23.0_f64).sqrt()
    });

    assert_eq!(run.executed_iterations(), 10_000);
    assert!(run.ops_per_ms() > 0.0);
}
