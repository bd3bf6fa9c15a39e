//! Platform abstraction trait definitions.

use std::fmt::Debug;

use crate::session::{EventStream, TraceSession};
use crate::{SessionError, SessionOptions};

/// Provides access to the event-tracing facility.
///
/// This trait abstracts the underlying tracing backend, allowing for both
/// the real implementation (fed by the in-process provider) and a fake
/// implementation (for testing).
pub(crate) trait Platform: Debug + Send + Sync + 'static {
    /// Whether the caller holds whatever is required to enable the tracing
    /// provider. When this is false, no session can deliver events.
    fn is_elevated(&self) -> bool;

    /// The id of the current process, used to filter events down to this
    /// process on the machine-wide stream.
    fn process_id(&self) -> u32;

    /// Requests a full collection cycle from any collector-aware host.
    fn collect_garbage(&self);

    /// Waits until finalization work queued by a previous collection has
    /// completed.
    fn wait_for_finalizers(&self);

    /// Opens a new real-time tracing session under the given unique name.
    ///
    /// Returns the session handle and its live event stream. Fails when the
    /// name is already in use or the backend refuses the session.
    fn start_session(
        &self,
        name: &str,
        options: SessionOptions,
    ) -> Result<(TraceSession, EventStream), SessionError>;
}
