//! Error types of the tracing session lifecycle.

use thiserror::Error;

/// Failure to create or start a tracing session.
///
/// Session-lifecycle failures are fatal for the memory-profiling call that
/// encountered them: when the event source cannot be attached there is no
/// safe partial result, so no report is produced.
///
/// A privilege shortfall is deliberately not represented here - it is
/// reported through the [`Reporter`](crate::Reporter) boundary and results in
/// an early return without measurement, not an error.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
#[non_exhaustive]
pub enum SessionError {
    /// A session with the requested name is already active, typically left
    /// behind by a crashed run of the same profiled program.
    #[error("a tracing session named '{0}' is already active")]
    NameInUse(String),

    /// The tracing backend refused the session for another reason.
    #[error("the tracing backend is unavailable: {0}")]
    BackendUnavailable(String),

    /// The background event drain worker could not be started.
    #[error("could not spawn the event drain worker: {0}")]
    WorkerSpawn(String),
}
