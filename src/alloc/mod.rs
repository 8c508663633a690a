// Aligned allocation for vectorized sample processing
//
// Every sample block handed to the render path starts on a 64-byte boundary
// so SIMD loads and cache-line prefetch behave. Exactly one of three backends
// is compiled into the public entry points, selected by Cargo feature:
//
// - default: the system allocator with an explicitly aligned Layout
// - `alloc-pooled`: a cache-aware freelist pool over the system allocator
// - `alloc-manual`: over-allocation with a recovery header, for platforms
//   where an aligned facility is unavailable
//
// Blocks must be released through the same entry points that produced them.
// Since only one backend exists per build, a cross-backend release cannot be
// expressed.

mod aligned;
mod storage;

// Unselected backends stay compiled so their invariants remain testable.
#[cfg_attr(not(feature = "alloc-manual"), allow(dead_code))]
mod manual;
#[cfg_attr(not(feature = "alloc-pooled"), allow(dead_code))]
mod pooled;
#[cfg_attr(feature = "alloc-manual", allow(dead_code))]
mod system;

pub use aligned::{
    alloc_aligned, alloc_aligned_zeroed, alloc_samples, alloc_samples_zeroed, release_aligned,
    release_samples, MEMORY_ALIGNMENT,
};
pub use storage::SampleStorage;
