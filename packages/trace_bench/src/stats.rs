//! Accumulated memory-tracing counters for one profiled run.

/// Number of tracked collection generations (0 through 3).
pub const GENERATION_COUNT: usize = 4;

/// Allocation and collection counters accumulated over the lifetime of one
/// memory-profiled run.
///
/// Written exclusively by the event drain worker; the measuring thread only
/// reads it after the worker has stopped, so no synchronization is carried
/// inside.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AllocationStat {
    gen_counts: [u64; GENERATION_COUNT],
    allocated_bytes: u64,
    total_operations: u64,
}

impl AllocationStat {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one allocation-tick event.
    pub(crate) fn record_tick(&mut self, bytes: u64) {
        // Never going to overflow u64, so no point doing slower checked arithmetic here.
        self.total_operations = self.total_operations.wrapping_add(1);
        self.allocated_bytes = self.allocated_bytes.wrapping_add(bytes);
    }

    /// Records one collection-start event.
    ///
    /// Induced collections are excluded so that collections the harness
    /// forces for heap normalization do not show up as workload activity.
    /// Generations beyond the tracked range are ignored.
    pub(crate) fn record_collection(&mut self, generation: usize, induced: bool) {
        if induced {
            return;
        }

        if let Some(slot) = self.gen_counts.get_mut(generation) {
            *slot = slot.wrapping_add(1);
        }
    }

    /// Collection counts indexed by generation depth.
    #[must_use]
    pub fn gen_counts(&self) -> [u64; GENERATION_COUNT] {
        self.gen_counts
    }

    /// Collection count of one generation; zero for generations beyond the
    /// tracked range.
    #[must_use]
    pub fn collections(&self, generation: usize) -> u64 {
        self.gen_counts.get(generation).copied().unwrap_or(0)
    }

    /// Total bytes reported by allocation ticks.
    #[must_use]
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes
    }

    /// Total allocation-tick events observed.
    #[must_use]
    pub fn total_operations(&self) -> u64 {
        self.total_operations
    }

    /// Mean allocated bytes per observed operation, with integer truncation.
    ///
    /// Returns 0 when no operations were observed.
    #[expect(clippy::integer_division, reason = "we accept loss of precision")]
    #[expect(
        clippy::arithmetic_side_effects,
        reason = "division by zero excluded via if-else"
    )]
    #[must_use]
    pub fn allocated_by_operation(&self) -> u64 {
        if self.total_operations == 0 {
            0
        } else {
            self.allocated_bytes / self.total_operations
        }
    }
}
