//! The outcome of one timed measurement.

use std::time::Duration;

/// One invocation of a candidate operation under measurement.
///
/// Created by the profiler that owns the run, reported once and then
/// discarded; runs are never persisted or compared across invocations.
#[derive(Clone, Debug)]
pub struct TimedRun {
    label: String,
    iterations: u64,
    executed_iterations: u64,
    elapsed: Duration,
}

impl TimedRun {
    pub(crate) fn new(
        label: impl Into<String>,
        iterations: u64,
        executed_iterations: u64,
        elapsed: Duration,
    ) -> Self {
        Self {
            label: label.into(),
            iterations,
            executed_iterations,
            elapsed,
        }
    }

    /// The description the run was requested under.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The requested iteration count.
    #[must_use]
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// The number of candidate invocations actually measured.
    ///
    /// Equal to [`iterations()`](Self::iterations) except in the unrolled
    /// variant, where counts not divisible by the unroll factor truncate.
    #[must_use]
    pub fn executed_iterations(&self) -> u64 {
        self.executed_iterations
    }

    /// Wall-clock time of the measured window.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }

    /// Elapsed time in raw monotonic clock ticks (nanoseconds).
    #[must_use]
    pub fn elapsed_ticks(&self) -> u128 {
        self.elapsed.as_nanos()
    }

    /// Throughput as operations per millisecond, computed over the requested
    /// iteration count.
    ///
    /// A run requested with zero iterations has no defined throughput and
    /// yields NaN rather than a division fault.
    #[must_use]
    pub fn ops_per_ms(&self) -> f64 {
        if self.iterations == 0 {
            return f64::NAN;
        }

        #[expect(
            clippy::cast_precision_loss,
            reason = "iteration counts far exceeding f64 precision are not realistic"
        )]
        let iterations = self.iterations as f64;
        iterations / self.elapsed_ms()
    }

    /// The one-line result summary shared by all profiler variants.
    pub(crate) fn summary(&self) -> String {
        format!(
            "{:.2} ms ({} ticks) (over {} iterations), {:.0} ops/millisecond.",
            self.elapsed_ms(),
            self.elapsed_ticks(),
            self.iterations,
            self.ops_per_ms()
        )
    }
}
