//! RAII owner for an aligned region of `f32` samples.

use std::ptr::NonNull;

use super::aligned::{alloc_samples, alloc_samples_zeroed, release_samples};

/// Exclusively owned, 64-byte-aligned sample memory.
///
/// Dropping the value releases the block through the compiled backend.
/// Contents of [`SampleStorage::new`] are uninitialized; callers that need
/// silence use [`SampleStorage::zeroed`] or fill explicitly.
pub struct SampleStorage {
    ptr: NonNull<f32>,
    len: usize,
}

impl SampleStorage {
    /// Allocate uninitialized storage for `len` samples.
    ///
    /// Returns `None` on allocation failure.
    pub fn new(len: usize) -> Option<Self> {
        let ptr = alloc_samples::<f32>(len)?;
        Some(Self { ptr, len })
    }

    /// Allocate zero-filled storage for `len` samples.
    pub fn zeroed(len: usize) -> Option<Self> {
        let ptr = alloc_samples_zeroed::<f32>(len)?;
        Some(Self { ptr, len })
    }

    /// Number of samples in the block.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_ptr(&self) -> *const f32 {
        self.ptr.as_ptr() as *const f32
    }

    pub fn as_slice(&self) -> &[f32] {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for SampleStorage {
    fn drop(&mut self) {
        unsafe { release_samples(self.ptr, self.len) };
    }
}

// SampleStorage owns its memory exclusively, so it can cross threads.
unsafe impl Send for SampleStorage {}

impl std::fmt::Debug for SampleStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleStorage")
            .field("len", &self.len)
            .field("ptr", &self.ptr)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::MEMORY_ALIGNMENT;

    #[test]
    fn test_storage_alignment() {
        let storage = SampleStorage::new(2048).expect("allocation should succeed");
        assert_eq!(storage.as_ptr() as usize % MEMORY_ALIGNMENT, 0);
        assert_eq!(storage.len(), 2048);
    }

    #[test]
    fn test_zeroed_storage() {
        let storage = SampleStorage::zeroed(1024).expect("allocation should succeed");
        assert!(storage.as_slice().iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_empty_storage() {
        let storage = SampleStorage::new(0).expect("zero-length storage is legal");
        assert!(storage.is_empty());
        assert_eq!(storage.as_slice().len(), 0);
    }

    #[test]
    fn test_write_read() {
        let mut storage = SampleStorage::zeroed(16).expect("allocation should succeed");
        storage.as_mut_slice()[3] = 0.5;
        assert_eq!(storage.as_slice()[3], 0.5);
        assert_eq!(storage.as_slice()[4], 0.0);
    }
}
