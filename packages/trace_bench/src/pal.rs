//! Platform abstraction layer for the event-tracing facility.
//!
//! This module provides a platform abstraction that allows switching between
//! the real in-process tracing provider and a scripted fake implementation
//! for testing purposes.

mod abstractions;
mod facade;
#[cfg(test)]
mod fake;
mod real;

pub(crate) use abstractions::Platform;
pub(crate) use facade::PlatformFacade;
#[cfg(test)]
pub(crate) use fake::FakePlatform;
pub(crate) use real::on_allocation;
pub use real::publish_collection;
