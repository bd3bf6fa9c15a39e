//! Enum facade over the platform implementations.

#[cfg(test)]
use std::sync::Arc;

use crate::pal::abstractions::Platform;
#[cfg(test)]
use crate::pal::fake::FakePlatform;
use crate::pal::real::RealPlatform;
use crate::session::{EventStream, TraceSession};
use crate::{SessionError, SessionOptions};

/// Dispatches platform calls to the real or (in tests) fake implementation
/// without exposing generic parameters on the profiler types.
#[derive(Clone, Debug)]
pub(crate) enum PlatformFacade {
    Real(RealPlatform),
    #[cfg(test)]
    Fake(Arc<FakePlatform>),
}

impl PlatformFacade {
    /// Creates a facade backed by the real tracing facility.
    pub(crate) const fn real() -> Self {
        Self::Real(RealPlatform::new())
    }

    /// Creates a facade backed by a scripted fake.
    #[cfg(test)]
    pub(crate) fn fake(platform: FakePlatform) -> Self {
        Self::Fake(Arc::new(platform))
    }
}

impl Platform for PlatformFacade {
    fn is_elevated(&self) -> bool {
        match self {
            Self::Real(platform) => platform.is_elevated(),
            #[cfg(test)]
            Self::Fake(platform) => platform.is_elevated(),
        }
    }

    fn process_id(&self) -> u32 {
        match self {
            Self::Real(platform) => platform.process_id(),
            #[cfg(test)]
            Self::Fake(platform) => platform.process_id(),
        }
    }

    fn collect_garbage(&self) {
        match self {
            Self::Real(platform) => platform.collect_garbage(),
            #[cfg(test)]
            Self::Fake(platform) => platform.collect_garbage(),
        }
    }

    fn wait_for_finalizers(&self) {
        match self {
            Self::Real(platform) => platform.wait_for_finalizers(),
            #[cfg(test)]
            Self::Fake(platform) => platform.wait_for_finalizers(),
        }
    }

    fn start_session(
        &self,
        name: &str,
        options: SessionOptions,
    ) -> Result<(TraceSession, EventStream), SessionError> {
        match self {
            Self::Real(platform) => platform.start_session(name, options),
            #[cfg(test)]
            Self::Fake(platform) => platform.start_session(name, options),
        }
    }
}
