//! Public allocation entry points and backend dispatch.

use std::mem;
use std::ptr::NonNull;

/// Alignment of every block returned by this module, in bytes.
///
/// 64 covers the widest vector width in use (AVX-512) and equals the cache
/// line size of current x86_64 and aarch64 parts.
pub const MEMORY_ALIGNMENT: usize = 64;

cfg_if::cfg_if! {
    if #[cfg(feature = "alloc-manual")] {
        use super::manual as backend;
    } else if #[cfg(feature = "alloc-pooled")] {
        use super::pooled as backend;
    } else {
        use super::system as backend;
    }
}

/// Allocate `nbytes` of uninitialized memory aligned to [`MEMORY_ALIGNMENT`].
///
/// Returns `None` on allocation failure; never panics. Zero-byte requests
/// succeed with a well-aligned dangling pointer that must still be passed to
/// [`release_aligned`] with the same size.
pub fn alloc_aligned(nbytes: usize) -> Option<NonNull<u8>> {
    if nbytes == 0 {
        return Some(dangling());
    }
    backend::allocate(nbytes)
}

/// Allocate `nbytes` of zero-filled memory aligned to [`MEMORY_ALIGNMENT`].
///
/// Same failure contract as [`alloc_aligned`].
pub fn alloc_aligned_zeroed(nbytes: usize) -> Option<NonNull<u8>> {
    if nbytes == 0 {
        return Some(dangling());
    }
    backend::allocate_zeroed(nbytes)
}

/// Release a block previously returned by [`alloc_aligned`] or
/// [`alloc_aligned_zeroed`] with the same `nbytes`.
///
/// # Safety
///
/// `ptr` must come from this module's allocation entry points with exactly
/// this `nbytes`, and must not have been released before.
pub unsafe fn release_aligned(ptr: NonNull<u8>, nbytes: usize) {
    if nbytes == 0 {
        return;
    }
    backend::release(ptr, nbytes);
}

/// Allocate aligned, uninitialized memory for `n` values of `T`.
///
/// Pure byte allocation: no `T` is constructed, and the size computation
/// saturates into failure rather than wrapping.
pub fn alloc_samples<T>(n: usize) -> Option<NonNull<T>> {
    let nbytes = n.checked_mul(mem::size_of::<T>())?;
    alloc_aligned(nbytes).map(NonNull::cast)
}

/// Allocate aligned, zero-filled memory for `n` values of `T`.
pub fn alloc_samples_zeroed<T>(n: usize) -> Option<NonNull<T>> {
    let nbytes = n.checked_mul(mem::size_of::<T>())?;
    alloc_aligned_zeroed(nbytes).map(NonNull::cast)
}

/// Release a typed block previously returned by [`alloc_samples`] or
/// [`alloc_samples_zeroed`] for the same `n`.
///
/// # Safety
///
/// Same contract as [`release_aligned`]. No `T` destructors run.
pub unsafe fn release_samples<T>(ptr: NonNull<T>, n: usize) {
    release_aligned(ptr.cast(), n * mem::size_of::<T>());
}

// Zero-byte blocks never touch a backend; any 64-aligned non-null address
// stands in for them.
fn dangling() -> NonNull<u8> {
    unsafe { NonNull::new_unchecked(MEMORY_ALIGNMENT as *mut u8) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocation_is_aligned() {
        for nbytes in [1, 7, 64, 100, 4096, 1 << 20] {
            let ptr = alloc_aligned(nbytes).expect("allocation should succeed");
            assert_eq!(
                ptr.as_ptr() as usize % MEMORY_ALIGNMENT,
                0,
                "{} byte block should start on a {} byte boundary",
                nbytes,
                MEMORY_ALIGNMENT
            );
            unsafe { release_aligned(ptr, nbytes) };
        }
    }

    #[test]
    fn test_zeroed_allocation_reads_back_zero() {
        let nbytes = 1024;
        let ptr = alloc_aligned_zeroed(nbytes).expect("allocation should succeed");
        let bytes = unsafe { std::slice::from_raw_parts(ptr.as_ptr(), nbytes) };
        assert!(bytes.iter().all(|&b| b == 0), "all bytes should be zero");
        unsafe { release_aligned(ptr, nbytes) };
    }

    #[test]
    fn test_typed_allocation() {
        let n = 512;
        let ptr = alloc_samples::<f32>(n).expect("allocation should succeed");
        assert_eq!(ptr.as_ptr() as usize % MEMORY_ALIGNMENT, 0);
        unsafe { release_samples(ptr, n) };
    }

    #[test]
    fn test_typed_allocation_overflow_fails() {
        assert!(
            alloc_samples::<f32>(usize::MAX).is_none(),
            "overflowing byte size should report failure, not wrap"
        );
    }

    #[test]
    fn test_zero_byte_allocation() {
        let ptr = alloc_aligned(0).expect("zero-byte allocation is legal");
        assert_eq!(ptr.as_ptr() as usize % MEMORY_ALIGNMENT, 0);
        unsafe { release_aligned(ptr, 0) };
    }
}
