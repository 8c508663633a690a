//! System backend: the platform allocator with an explicitly aligned layout.

use std::alloc::{alloc, alloc_zeroed, dealloc, Layout};
use std::ptr::NonNull;

use super::MEMORY_ALIGNMENT;

pub(super) fn allocate(nbytes: usize) -> Option<NonNull<u8>> {
    debug_assert!(nbytes > 0);
    let layout = Layout::from_size_align(nbytes, MEMORY_ALIGNMENT).ok()?;
    NonNull::new(unsafe { alloc(layout) })
}

pub(super) fn allocate_zeroed(nbytes: usize) -> Option<NonNull<u8>> {
    debug_assert!(nbytes > 0);
    let layout = Layout::from_size_align(nbytes, MEMORY_ALIGNMENT).ok()?;
    NonNull::new(unsafe { alloc_zeroed(layout) })
}

/// # Safety
///
/// `ptr` must have been returned by this backend's allocate calls with the
/// same `nbytes`.
pub(super) unsafe fn release(ptr: NonNull<u8>, nbytes: usize) {
    debug_assert!(nbytes > 0);
    let layout = Layout::from_size_align_unchecked(nbytes, MEMORY_ALIGNMENT);
    dealloc(ptr.as_ptr(), layout);
}
