//! Native stack headroom for recursive walks.
//!
//! `Runtime::invoke` re-enters itself once per nested call and
//! `resolve_recursive` once per environment on the chain. Both run their
//! recursive step through [`ensure_sufficient_stack`] so that the configured
//! call-depth limit, not the thread's stack size, is what stops a deep chain.

/// Remaining stack below which a new segment is allocated (128 KiB).
#[cfg(not(target_arch = "wasm32"))]
const MIN_REMAINING: usize = 128 * 1024;

/// Size of each newly allocated stack segment (2 MiB).
#[cfg(not(target_arch = "wasm32"))]
const SEGMENT_SIZE: usize = 2 * 1024 * 1024;

/// Run `f`, first growing the stack if less than [`MIN_REMAINING`] is left.
#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(MIN_REMAINING, SEGMENT_SIZE, f)
}

/// WASM manages its own stack; call straight through.
#[inline]
#[cfg(target_arch = "wasm32")]
pub fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
