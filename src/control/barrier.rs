//! Render-path block barrier.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared counter of completed render blocks.
///
/// The render path bumps it between processing blocks; the control worker
/// reads it to decide when storage freed during an earlier block can no
/// longer be referenced and may be reclaimed.
#[derive(Debug, Clone, Default)]
pub struct ReleaseBarrier {
    completed: Arc<AtomicU64>,
}

impl ReleaseBarrier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called by the render path after it finishes a processing block and
    /// holds no more buffer references from it. Lock-free and wait-free.
    pub fn complete_block(&self) {
        self.completed.fetch_add(1, Ordering::Release);
    }

    /// Number of fully completed render blocks.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }
}
