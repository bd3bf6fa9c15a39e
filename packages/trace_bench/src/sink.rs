//! Value sinks that force a produced value to be observed without storing it.

use std::hint::black_box;

/// Consumes a value so that computing it is not flagged as dead code, while
/// still allowing the optimizer to eliminate the computation entirely.
///
/// This is the cheap sink: it should compile down to nothing at all. Use it
/// when you want to measure a candidate under the most aggressive
/// optimization the compiler is willing to apply.
#[inline(always)]
pub fn consume<T>(_value: T) {}

/// Consumes a value through a call that is never inlined, forcing the
/// computation to actually happen.
///
/// The call overhead is small and identical for every candidate, so relative
/// comparisons between candidates remain valid. This is a best-effort
/// anti-optimization measure: the exact guarantees are target-compiler
/// specific and cannot be verified by a test suite, only inspected in the
/// emitted code.
#[inline(never)]
pub fn consume_no_inline<T>(value: T) {
    black_box(value);
}
