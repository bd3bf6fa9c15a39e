//! Wall-clock throughput measurement.

use std::sync::Arc;
use std::time::Instant;

use crate::pal::{Platform, PlatformFacade};
use crate::{ConsoleReporter, Reporter, Severity, TimedRun, consume, consume_no_inline};

/// How many candidate invocations the unrolled variant performs per loop
/// iteration.
pub const UNROLL_FACTOR: u64 = 20;

/// Measures wall-clock throughput of a candidate operation.
///
/// Every profiling variant observes the identical protocol: normalize the
/// heap (collect, wait for pending finalizers, collect), run one unmeasured
/// warm-up invocation to absorb one-time costs, then time exactly the
/// requested number of invocations in a tight loop. The variants differ only
/// in how the per-iteration return value is handled - that difference is the
/// experiment variable, so the shared protocol must never diverge between
/// them or cross-variant comparison becomes meaningless.
///
/// # Examples
///
/// ```
/// use trace_bench::Profiler;
///
/// let profiler = Profiler::new();
/// let run = profiler.profile_consume("square root", 100_000, || {
///     std::hint::black_box(23.0_f64).sqrt()
/// });
/// assert_eq!(run.executed_iterations(), 100_000);
/// ```
#[derive(Debug)]
pub struct Profiler {
    platform: PlatformFacade,
    reporter: Arc<dyn Reporter>,
}

impl Profiler {
    /// Creates a profiler that reports to the console.
    ///
    /// Construction reports the build profile: benchmarking an unoptimized
    /// build produces misleading numbers, so a debug build is called out
    /// before any result can be misread.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(PlatformFacade::real(), Arc::new(ConsoleReporter::new()))
    }

    /// Creates a profiler that reports through the given reporter.
    #[must_use]
    pub fn with_reporter(reporter: Arc<dyn Reporter>) -> Self {
        Self::with_parts(PlatformFacade::real(), reporter)
    }

    #[cfg(test)]
    pub(crate) fn with_platform(platform: PlatformFacade, reporter: Arc<dyn Reporter>) -> Self {
        Self::with_parts(platform, reporter)
    }

    fn with_parts(platform: PlatformFacade, reporter: Arc<dyn Reporter>) -> Self {
        let profiler = Self { platform, reporter };
        profiler.report_build_profile();
        profiler
    }

    fn report_build_profile(&self) {
        if cfg!(debug_assertions) {
            self.reporter.line(
                Severity::Warning,
                "Running an unoptimized build; results are not representative",
            );
        } else {
            self.reporter
                .line(Severity::Success, "Running an optimized build");
        }

        self.reporter.line(
            Severity::Success,
            &format!("Application is {}-bit", usize::BITS),
        );
    }

    /// Collect, wait for pending finalizers, collect: normalizes the
    /// starting heap state so that allocations from before this run do not
    /// leak variance into it.
    fn normalize_heap(&self) {
        self.platform.collect_garbage();
        self.platform.wait_for_finalizers();
        self.platform.collect_garbage();
    }

    fn warn_if_degenerate(&self, iterations: u64) {
        if iterations == 0 {
            self.reporter.line(
                Severity::Warning,
                "0 iterations requested; throughput will be undefined",
            );
        }
    }

    fn finish(&self, variant: &str, run: &TimedRun) {
        self.reporter
            .line(Severity::Info, &format!("{variant} - {}", run.label()));
        self.reporter.line(Severity::Info, &run.summary());
    }

    /// Times a candidate that produces no value.
    pub fn profile(&self, label: &str, iterations: u64, mut action: impl FnMut()) -> TimedRun {
        self.warn_if_degenerate(iterations);
        self.normalize_heap();

        // warm up
        action();

        let started = Instant::now();
        for _ in 0..iterations {
            action();
        }
        let elapsed = started.elapsed();

        let run = TimedRun::new(label, iterations, iterations, elapsed);
        self.finish("Profile via an action", &run);
        run
    }

    /// Times a candidate whose result is consumed by the cheap sink.
    ///
    /// The value is computed each iteration but the optimizer remains free
    /// to eliminate the computation entirely.
    pub fn profile_consume<T>(
        &self,
        label: &str,
        iterations: u64,
        mut candidate: impl FnMut() -> T,
    ) -> TimedRun {
        self.warn_if_degenerate(iterations);
        self.normalize_heap();

        // warm up
        candidate();

        let started = Instant::now();
        for _ in 0..iterations {
            consume(candidate());
        }
        let elapsed = started.elapsed();

        let run = TimedRun::new(label, iterations, iterations, elapsed);
        self.finish("Profile with consume", &run);
        run
    }

    /// Times a candidate whose result is consumed by the never-inlined sink.
    ///
    /// The guaranteed call overhead is identical for every candidate, which
    /// makes this the conservative baseline for relative comparisons.
    pub fn profile_consume_no_inline<T>(
        &self,
        label: &str,
        iterations: u64,
        mut candidate: impl FnMut() -> T,
    ) -> TimedRun {
        self.warn_if_degenerate(iterations);
        self.normalize_heap();

        // warm up
        candidate();

        let started = Instant::now();
        for _ in 0..iterations {
            consume_no_inline(candidate());
        }
        let elapsed = started.elapsed();

        let run = TimedRun::new(label, iterations, iterations, elapsed);
        self.finish("Profile with consume (no inlining)", &run);
        run
    }

    /// Times a candidate whose result is stored into a single reused
    /// variable each iteration, simulating realistic "keep the result"
    /// usage.
    pub fn profile_store<T>(
        &self,
        label: &str,
        iterations: u64,
        mut candidate: impl FnMut() -> T,
    ) -> TimedRun {
        self.warn_if_degenerate(iterations);
        self.normalize_heap();

        let mut result = None;

        // warm up
        candidate();

        let started = Instant::now();
        for _ in 0..iterations {
            result = Some(candidate());
        }
        let elapsed = started.elapsed();

        consume(result);

        let run = TimedRun::new(label, iterations, iterations, elapsed);
        self.finish("Profile with store", &run);
        run
    }

    /// Times a candidate with the loop body unrolled [`UNROLL_FACTOR`]
    /// times, amortizing loop-control overhead to isolate per-operation
    /// cost. Each unrolled call consumes the result through the
    /// never-inlined sink.
    ///
    /// Iteration counts not divisible by [`UNROLL_FACTOR`] truncate via
    /// integer division: only `floor(iterations / 20) * 20` invocations are
    /// executed. This is a deliberate micro-benchmark convenience; it is
    /// reported as a warning and recorded in the run's executed count rather
    /// than silently adjusted. The throughput figure is still computed over
    /// the requested count, matching the other variants.
    pub fn profile_unrolled<T>(
        &self,
        label: &str,
        iterations: u64,
        mut candidate: impl FnMut() -> T,
    ) -> TimedRun {
        self.warn_if_degenerate(iterations);

        #[expect(
            clippy::integer_division,
            reason = "truncation is the documented contract"
        )]
        let loops = iterations / UNROLL_FACTOR;
        let executed = loops.wrapping_mul(UNROLL_FACTOR);
        if executed != iterations {
            self.reporter.line(
                Severity::Warning,
                &format!(
                    "{iterations} iterations is not divisible by {UNROLL_FACTOR}; executing {executed}"
                ),
            );
        }

        self.normalize_heap();

        // warm up
        candidate();

        let started = Instant::now();
        for _ in 0..loops {
            consume_no_inline(candidate());
            consume_no_inline(candidate());
            consume_no_inline(candidate());
            consume_no_inline(candidate());
            consume_no_inline(candidate());
            consume_no_inline(candidate());
            consume_no_inline(candidate());
            consume_no_inline(candidate());
            consume_no_inline(candidate());
            consume_no_inline(candidate());
            consume_no_inline(candidate());
            consume_no_inline(candidate());
            consume_no_inline(candidate());
            consume_no_inline(candidate());
            consume_no_inline(candidate());
            consume_no_inline(candidate());
            consume_no_inline(candidate());
            consume_no_inline(candidate());
            consume_no_inline(candidate());
            consume_no_inline(candidate());
        }
        let elapsed = started.elapsed();

        let run = TimedRun::new(label, iterations, executed, elapsed);
        self.finish("Profile with consume (no inlining, unrolled x20)", &run);
        run
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pal::FakePlatform;
    use crate::reporter::RecordingReporter;

    fn test_profiler() -> (Profiler, Arc<RecordingReporter>, FakePlatform) {
        let platform = FakePlatform::new();
        let reporter = Arc::new(RecordingReporter::new());
        let profiler = Profiler::with_platform(
            PlatformFacade::fake(platform.clone()),
            Arc::clone(&reporter) as Arc<dyn Reporter>,
        );
        (profiler, reporter, platform)
    }

    #[test]
    fn profile_invokes_candidate_once_per_iteration_plus_warm_up() {
        let (profiler, _reporter, _platform) = test_profiler();

        let mut calls = 0_u64;
        let run = profiler.profile("count", 10, || calls += 1);

        assert_eq!(calls, 11);
        assert_eq!(run.iterations(), 10);
        assert_eq!(run.executed_iterations(), 10);
    }

    #[test]
    fn all_consuming_variants_share_the_invocation_protocol() {
        let (profiler, _reporter, _platform) = test_profiler();

        let mut calls = 0_u64;
        profiler.profile_consume("consume", 7, || {
            calls += 1;
            calls
        });
        assert_eq!(calls, 8);

        calls = 0;
        profiler.profile_consume_no_inline("no inline", 7, || {
            calls += 1;
            calls
        });
        assert_eq!(calls, 8);

        calls = 0;
        profiler.profile_store("store", 7, || {
            calls += 1;
            calls
        });
        assert_eq!(calls, 8);
    }

    #[test]
    fn every_variant_normalizes_the_heap_identically() {
        let (profiler, _reporter, platform) = test_profiler();

        profiler.profile("a", 1, || {});
        assert_eq!(platform.collect_calls(), 2);
        assert_eq!(platform.finalizer_waits(), 1);

        profiler.profile_unrolled("b", 20, || 0_u64);
        assert_eq!(platform.collect_calls(), 4);
        assert_eq!(platform.finalizer_waits(), 2);
    }

    #[test]
    fn unrolled_truncates_to_a_multiple_of_the_unroll_factor() {
        let (profiler, reporter, _platform) = test_profiler();

        let mut calls = 0_u64;
        let run = profiler.profile_unrolled("truncated", 105, || {
            calls += 1;
            calls
        });

        // floor(105 / 20) * 20 = 100 measured invocations, plus warm-up.
        assert_eq!(run.executed_iterations(), 100);
        assert_eq!(run.iterations(), 105);
        assert_eq!(calls, 101);
        assert!(reporter.contains(Severity::Warning, "not divisible"));
    }

    #[test]
    fn unrolled_exact_multiple_emits_no_warning() {
        let (profiler, reporter, _platform) = test_profiler();

        let mut calls = 0_u64;
        let run = profiler.profile_unrolled("exact", 40, || {
            calls += 1;
            calls
        });

        assert_eq!(run.executed_iterations(), 40);
        assert_eq!(calls, 41);
        assert!(!reporter.contains(Severity::Warning, "not divisible"));
    }

    #[test]
    fn zero_iterations_runs_only_the_warm_up_and_warns() {
        let (profiler, reporter, _platform) = test_profiler();

        let mut calls = 0_u64;
        let run = profiler.profile("degenerate", 0, || calls += 1);

        assert_eq!(calls, 1);
        assert!(run.ops_per_ms().is_nan());
        assert!(reporter.contains(Severity::Warning, "0 iterations"));
    }

    #[test]
    fn elapsed_time_is_ordered_by_iteration_count() {
        let (profiler, _reporter, _platform) = test_profiler();

        let cheap = || std::hint::black_box(23.0_f64).sqrt();
        let small = profiler.profile_consume("small", 100, cheap);
        let large = profiler.profile_consume("large", 1_000_000, cheap);

        // Scheduling noise cannot plausibly invert a 10000x workload gap.
        assert!(large.elapsed() >= small.elapsed());
        assert!(large.ops_per_ms() > 0.0);
    }

    #[test]
    fn results_are_reported_with_the_variant_name() {
        let (profiler, reporter, _platform) = test_profiler();

        profiler.profile("labelled", 1, || {});

        assert!(reporter.contains(Severity::Info, "Profile via an action - labelled"));
        assert!(reporter.contains(Severity::Info, "over 1 iterations"));
    }

    // The profiler can be driven from any thread.
    static_assertions::assert_impl_all!(Profiler: Send, Sync);
}
