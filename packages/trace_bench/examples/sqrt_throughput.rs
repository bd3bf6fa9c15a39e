//! Times a trivial numeric candidate through every profiling variant, then
//! runs the same candidate under the memory profiler.
//!
//! The candidate is cheap enough that the differences between the variants
//! (sink cost, store cost, loop-control amortization) dominate the numbers,
//! which makes this a good calibration run for a new machine. The memory
//! profiling pass should report zero allocation activity for it.
//!
//! Run with: `cargo run --release --example sqrt_throughput`

use std::hint::black_box;

use trace_bench::{Allocator, MemoryProfiler, Profiler};

#[global_allocator]
static ALLOCATOR: Allocator<std::alloc::System> = Allocator::system();

const ITERATIONS: u64 = 10_000_000;

fn main() {
    let profiler = Profiler::new();
    let candidate = || black_box(23.0_f64).sqrt();

    profiler.profile("square root", ITERATIONS, || {
        black_box(23.0_f64).sqrt();
    });
    profiler.profile_consume("square root", ITERATIONS, candidate);
    profiler.profile_consume_no_inline("square root", ITERATIONS, candidate);
    profiler.profile_store("square root", ITERATIONS, candidate);
    profiler.profile_unrolled("square root", ITERATIONS, candidate);

    let memory_profiler = MemoryProfiler::new();
    memory_profiler
        .profile("square root", ITERATIONS, || {
            black_box(23.0_f64).sqrt();
        })
        .expect("tracing session could not be started");
}
