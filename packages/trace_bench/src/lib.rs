//! Throughput micro-benchmarking with trace-correlated memory profiling.
//!
//! This package measures the wall-clock throughput of a unit of work and,
//! optionally, correlates that work with memory-management activity
//! (allocation volume, collection counts) observed through an out-of-band
//! event-tracing facility. It answers both "how fast" and "how much garbage"
//! for the same workload.
//!
//! The core functionality includes:
//! - [`Profiler`] - Times a candidate operation under a fixed warm-up and
//!   heap-normalization protocol, in several return-value-handling variants
//! - [`MemoryProfiler`] - Wraps the same timing loop with a concurrently
//!   running consumer of allocation and collection events for this process
//! - [`Allocator`] - A memory allocator wrapper that turns the process into
//!   the tracing provider feeding those events
//! - [`consume`] / [`consume_no_inline`] - Value sinks that force evaluation
//!   of candidate return values without storing them
//!
//! This package is not meant for use in production, serving only as a
//! development tool.
//!
//! # Timing a candidate
//!
//! ```
//! use trace_bench::Profiler;
//!
//! let profiler = Profiler::new();
//! let run = profiler.profile_consume("square root", 10_000, || {
//!     std::hint::black_box(23.0_f64).sqrt()
//! });
//! assert_eq!(run.iterations(), 10_000);
//! ```
//!
//! # Correlating with memory activity
//!
//! Memory profiling requires the tracing provider, which is enabled by
//! installing the tracking allocator:
//!
//! ```
//! use trace_bench::{Allocator, MemoryProfiler};
//!
//! #[global_allocator]
//! static ALLOCATOR: Allocator<std::alloc::System> = Allocator::system();
//!
//! fn main() {
//!     let profiler = MemoryProfiler::new()
//!         .with_settle_delay(std::time::Duration::from_millis(100));
//!
//!     let outcome = profiler
//!         .profile("buffer fill", 100, || {
//!             let buffer = vec![0_u8; 64 * 1024];
//!             std::hint::black_box(&buffer);
//!         })
//!         .expect("tracing session could not be started");
//!
//!     if let Some(run) = outcome {
//!         println!("{} bytes/op", run.stat().allocated_by_operation());
//!     }
//! }
//! ```
//!
//! Without the allocator installed, the privilege check fails and
//! [`MemoryProfiler::profile()`] reports a notice and returns without
//! measuring anything.
//!
//! # Single-run semantics
//!
//! Each `profile` call performs one measured run after one warm-up
//! invocation. There is no outlier rejection, confidence interval or
//! multi-run variance analysis; results are reported and discarded, never
//! persisted or compared across runs.
//!
//! # Miri compatibility
//!
//! Miri replaces the global allocator with its own logic, so the memory
//! profiling path cannot be exercised under Miri.

mod allocator;
mod errors;
mod events;
mod memory;
mod pal;
mod reporter;
mod run;
mod session;
mod sink;
mod stats;
mod timing;

pub use allocator::*;
pub use errors::*;
pub use events::*;
pub use memory::*;
pub use pal::publish_collection;
pub use reporter::*;
pub use run::*;
pub use sink::*;
pub use stats::*;
pub use timing::*;

pub(crate) const ERR_POISONED_LOCK: &str =
    "encountered poisoned lock - program validity cannot be guaranteed";
