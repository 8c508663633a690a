//! Pooled backend: cache-aware freelists over the system allocator.
//!
//! Requests are rounded up to power-of-two size classes; released blocks go
//! back onto a bounded per-class freelist and are handed out again without a
//! system call. Blocks above the largest class bypass the pool entirely.
//! The freelist mutex is only ever contended on the control path.

use std::ptr::NonNull;
use std::sync::Mutex;

use once_cell::sync::Lazy;

use super::system;
use super::MEMORY_ALIGNMENT;

/// Smallest size class, one cache line.
const MIN_CLASS: usize = MEMORY_ALIGNMENT;
/// Largest pooled size class; bigger blocks go straight to the system.
const MAX_CLASS: usize = 1 << 20;
const CLASS_COUNT: usize = (MAX_CLASS.trailing_zeros() - MIN_CLASS.trailing_zeros()) as usize + 1;
/// Cap on retained blocks per class.
const MAX_FREE_PER_CLASS: usize = 16;

struct FreeBlock(NonNull<u8>);

// FreeBlock only ever wraps exclusively-owned pool memory.
unsafe impl Send for FreeBlock {}

struct PoolState {
    classes: [Vec<FreeBlock>; CLASS_COUNT],
}

static POOL: Lazy<Mutex<PoolState>> = Lazy::new(|| {
    Mutex::new(PoolState {
        classes: std::array::from_fn(|_| Vec::new()),
    })
});

fn lock_pool() -> std::sync::MutexGuard<'static, PoolState> {
    POOL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// Size class for a request, or None for blocks that bypass the pool.
fn class_of(nbytes: usize) -> Option<(usize, usize)> {
    let class_size = nbytes.next_power_of_two().max(MIN_CLASS);
    if class_size > MAX_CLASS {
        return None;
    }
    let index = (class_size.trailing_zeros() - MIN_CLASS.trailing_zeros()) as usize;
    Some((index, class_size))
}

pub(super) fn allocate(nbytes: usize) -> Option<NonNull<u8>> {
    debug_assert!(nbytes > 0);
    match class_of(nbytes) {
        Some((index, class_size)) => {
            if let Some(block) = lock_pool().classes[index].pop() {
                return Some(block.0);
            }
            system::allocate(class_size)
        }
        None => system::allocate(nbytes),
    }
}

pub(super) fn allocate_zeroed(nbytes: usize) -> Option<NonNull<u8>> {
    // Recycled blocks carry stale contents, so zero explicitly.
    let ptr = allocate(nbytes)?;
    unsafe { std::ptr::write_bytes(ptr.as_ptr(), 0, nbytes) };
    Some(ptr)
}

/// # Safety
///
/// `ptr` must have been returned by this backend's allocate calls with the
/// same `nbytes`.
pub(super) unsafe fn release(ptr: NonNull<u8>, nbytes: usize) {
    debug_assert!(nbytes > 0);
    match class_of(nbytes) {
        Some((index, class_size)) => {
            {
                let mut pool = lock_pool();
                if pool.classes[index].len() < MAX_FREE_PER_CLASS {
                    pool.classes[index].push(FreeBlock(ptr));
                    return;
                }
            }
            system::release(ptr, class_size);
        }
        None => system::release(ptr, nbytes),
    }
}
