//! Allocation wrapper that feeds the in-process tracing provider.

use std::alloc::{GlobalAlloc, Layout};
use std::fmt;

use crate::pal::on_allocation;

/// A memory allocator wrapper that turns this process into a tracing
/// provider: every allocation it serves feeds the quantized allocation-tick
/// stream consumed by active tracing sessions.
///
/// Installing it is what satisfies the [`MemoryProfiler`](crate::MemoryProfiler)
/// privilege check; without it no memory events can be observed and memory
/// profiling aborts early.
///
/// # Examples
///
/// ```rust
/// use trace_bench::Allocator;
///
/// #[global_allocator]
/// static ALLOCATOR: Allocator<std::alloc::System> = Allocator::system();
/// ```
pub struct Allocator<A: GlobalAlloc> {
    inner: A,
}

impl<A: GlobalAlloc> fmt::Debug for Allocator<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Allocator")
            .field("inner", &"<allocator>")
            .finish()
    }
}

impl Allocator<std::alloc::System> {
    /// Creates a tracking allocator using the system's default allocator.
    ///
    /// This is a convenience method for the common case of wanting to feed
    /// the tracing provider without changing the allocation strategy.
    #[must_use]
    #[inline]
    pub const fn system() -> Self {
        Self {
            inner: std::alloc::System,
        }
    }
}

impl<A: GlobalAlloc> Allocator<A> {
    /// Creates a tracking allocator wrapping the provided allocator.
    ///
    /// The resulting allocator has the same behavior characteristics as the
    /// underlying allocator, plus the event publication logic.
    #[must_use]
    #[inline]
    pub const fn new(allocator: A) -> Self {
        Self { inner: allocator }
    }
}

// SAFETY: We delegate all allocation operations to the underlying allocator,
// which already implements GlobalAlloc safely, while adding event publication.
unsafe impl<A: GlobalAlloc> GlobalAlloc for Allocator<A> {
    #[inline]
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        on_allocation(layout.size());

        // SAFETY: We forward the call to the underlying allocator which implements GlobalAlloc.
        unsafe { self.inner.alloc(layout) }
    }

    #[inline]
    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        // SAFETY: We forward the call to the underlying allocator which implements GlobalAlloc.
        unsafe { self.inner.dealloc(ptr, layout) }
    }

    #[inline]
    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        on_allocation(layout.size());

        // SAFETY: We forward the call to the underlying allocator which implements GlobalAlloc.
        unsafe { self.inner.alloc_zeroed(layout) }
    }

    #[inline]
    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        on_allocation(new_size);

        // SAFETY: We forward the call to the underlying allocator which implements GlobalAlloc.
        unsafe { self.inner.realloc(ptr, layout, new_size) }
    }
}
