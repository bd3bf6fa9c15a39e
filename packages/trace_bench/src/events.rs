//! The event model of the tracing facility boundary.

/// A single event observed on a tracing session's live stream.
///
/// Every event carries the id of the process it originated from; consumers
/// interested in their own process only must filter on it, as the facility is
/// machine-wide.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[expect(
    clippy::exhaustive_enums,
    reason = "consumers match on the full event set; that is the stream contract"
)]
pub enum TraceEvent {
    /// A quantum of memory has been allocated since the last such event was
    /// published for the originating thread.
    AllocationTick {
        /// Id of the process the allocations happened in.
        process_id: u32,
        /// Bytes allocated since the previous tick.
        bytes: u64,
    },
    /// A collection cycle is beginning.
    CollectionStart {
        /// Id of the process the collection runs in.
        process_id: u32,
        /// Generation depth of the cycle (0 is the youngest generation).
        generation: usize,
        /// Whether the cycle was explicitly requested by program code rather
        /// than triggered by memory pressure.
        induced: bool,
    },
}

/// Which event categories a session streams.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[non_exhaustive]
pub enum EventInterest {
    /// Allocation ticks and collection starts.
    GarbageCollection,
}

/// How much detail the enabled provider emits.
#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
#[expect(
    clippy::exhaustive_enums,
    reason = "mirroring the two verbosity levels the facility distinguishes"
)]
pub enum Verbosity {
    /// Coarse lifecycle events only.
    Informational,
    /// Enough detail to carry allocation amounts and generation depths.
    Verbose,
}

/// Configuration applied when a tracing session is started.
#[derive(Clone, Copy, Debug)]
#[expect(
    clippy::exhaustive_structs,
    reason = "a plain parameter block; every field is part of the contract"
)]
pub struct SessionOptions {
    /// The event subset the provider is enabled for.
    pub interest: EventInterest,
    /// The verbosity the provider is enabled at.
    pub verbosity: Verbosity,
    /// Whether dropping the session handle stops the underlying resource.
    ///
    /// The resource outlives the owning process when leaked, so this is on
    /// for every profiler-owned session.
    pub stop_on_drop: bool,
}

impl SessionOptions {
    /// Options for a garbage-collection profiling session: verbose GC events,
    /// resource released when the handle goes away.
    #[must_use]
    pub const fn gc() -> Self {
        Self {
            interest: EventInterest::GarbageCollection,
            verbosity: Verbosity::Verbose,
            stop_on_drop: true,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::gc()
    }
}
