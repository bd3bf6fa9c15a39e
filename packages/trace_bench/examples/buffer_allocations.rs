//! Correlates the throughput of an allocating candidate with its memory
//! activity.
//!
//! Installing the tracking allocator makes this process its own tracing
//! provider; without that line the memory profiler reports a notice and
//! declines to measure.
//!
//! Run with: `cargo run --release --example buffer_allocations`

use std::hint::black_box;

use trace_bench::{Allocator, MemoryProfiler};

#[global_allocator]
static ALLOCATOR: Allocator<std::alloc::System> = Allocator::system();

const ITERATIONS: u64 = 10_000;
const BUFFER_SIZE: usize = 100 * 1024;

fn main() {
    let profiler = MemoryProfiler::new();

    let outcome = profiler
        .profile("buffer churn", ITERATIONS, || {
            let buffer = vec![0_u8; BUFFER_SIZE];
            black_box(&buffer);
        })
        .expect("tracing session could not be started");

    if let Some(run) = outcome {
        println!(
            "observed {} allocation ticks totalling {} bytes",
            run.stat().total_operations(),
            run.stat().allocated_bytes()
        );
    }
}
