//! The indexed buffer table.
//!
//! A fixed-length sequence of slots, each explicitly tagged Free or
//! Allocated. Every mutating operation applies its state guard first, so no
//! operation ever executes against a slot in the wrong state. The table does
//! no locking; callers serialize access externally (in this crate, the
//! control worker is the only writer).
//!
//! `free` does not release storage: it detaches the buffer and hands it back
//! so the caller can stage it until the render path passes a barrier.

use std::mem;
use std::path::Path;

use log::debug;

use crate::buffer::SampleBuffer;
use crate::codec::{HeaderFormat, SampleFileCodec, SampleFormat};
use crate::error::BufferError;

/// Allocation state of one table position, tagged explicitly rather than
/// inferred from a null sentinel.
enum Slot {
    Free,
    Allocated(SampleBuffer),
}

pub struct SampleTable {
    slots: Vec<Slot>,
}

impl SampleTable {
    /// A table of `capacity` slots, all Free.
    pub fn new(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity);
        slots.resize_with(capacity, || Slot::Free);
        Self { slots }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Error if the slot already holds a buffer.
    ///
    /// Index bounds are a caller contract, not validated here.
    pub fn check_unused(&self, index: usize) -> Result<(), BufferError> {
        debug_assert!(index < self.slots.len());
        match self.slots[index] {
            Slot::Allocated(_) => Err(BufferError::AlreadyInUse { index }),
            Slot::Free => Ok(()),
        }
    }

    /// Error if the slot holds no buffer.
    pub fn check_in_use(&self, index: usize) -> Result<(), BufferError> {
        debug_assert!(index < self.slots.len());
        match self.slots[index] {
            Slot::Free => Err(BufferError::NotInUse { index }),
            Slot::Allocated(_) => Ok(()),
        }
    }

    /// Allocate `index` with uninitialized storage.
    pub fn allocate(
        &mut self,
        index: usize,
        frames: usize,
        channels: usize,
        sample_rate: u32,
    ) -> Result<(), BufferError> {
        self.check_unused(index)?;
        let buffer = SampleBuffer::allocate(frames, channels, sample_rate)?;
        debug!(
            "[SampleTable] allocated buffer {}: {} frames, {} channels",
            index, frames, channels
        );
        self.slots[index] = Slot::Allocated(buffer);
        Ok(())
    }

    /// Allocate `index` from a sound file.
    pub fn read_allocate(
        &mut self,
        index: usize,
        codec: &dyn SampleFileCodec,
        path: &Path,
        start_frame: usize,
        frames: Option<usize>,
    ) -> Result<(), BufferError> {
        self.check_unused(index)?;
        let buffer = SampleBuffer::read_file(codec, path, start_frame, frames)?;
        debug!(
            "[SampleTable] read {} into buffer {}: {} frames, {} channels",
            path.display(),
            index,
            buffer.frames(),
            buffer.channels()
        );
        self.slots[index] = Slot::Allocated(buffer);
        Ok(())
    }

    /// Allocate `index` from a channel subset of a sound file.
    pub fn read_allocate_channels(
        &mut self,
        index: usize,
        codec: &dyn SampleFileCodec,
        path: &Path,
        start_frame: usize,
        frames: Option<usize>,
        channels: &[usize],
    ) -> Result<(), BufferError> {
        self.check_unused(index)?;
        let buffer = SampleBuffer::read_file_channels(codec, path, start_frame, frames, channels)?;
        self.slots[index] = Slot::Allocated(buffer);
        Ok(())
    }

    /// Detach the buffer at `index`, returning the slot to Free.
    ///
    /// The caller owns the returned buffer and decides when its storage is
    /// actually released; the render path may still hold a read reference
    /// until it passes a block barrier.
    pub fn free(&mut self, index: usize) -> Result<SampleBuffer, BufferError> {
        self.check_in_use(index)?;
        match mem::replace(&mut self.slots[index], Slot::Free) {
            Slot::Allocated(buffer) => {
                debug!("[SampleTable] freed buffer {}", index);
                Ok(buffer)
            }
            Slot::Free => unreachable!("check_in_use guards the Free arm"),
        }
    }

    /// Fill the buffer at `index` with silence.
    pub fn zero(&mut self, index: usize) -> Result<(), BufferError> {
        self.buffer_mut(index)?.zero();
        Ok(())
    }

    /// Scatter write into the buffer at `index`.
    pub fn set_samples_at(
        &mut self,
        index: usize,
        writes: &[(usize, f32)],
    ) -> Result<(), BufferError> {
        self.buffer_mut(index)?.set_samples_at(writes);
        Ok(())
    }

    /// Contiguous write into the buffer at `index`; returns samples written.
    pub fn set_samples(
        &mut self,
        index: usize,
        position: usize,
        values: &[f32],
    ) -> Result<usize, BufferError> {
        Ok(self.buffer_mut(index)?.set_samples(position, values))
    }

    /// Broadcast fill into the buffer at `index`; returns samples written.
    pub fn fill_samples(
        &mut self,
        index: usize,
        position: usize,
        count: usize,
        value: f32,
    ) -> Result<usize, BufferError> {
        Ok(self.buffer_mut(index)?.fill_samples(position, count, value))
    }

    /// Encode a frame range of the buffer at `index` to a sound file.
    #[allow(clippy::too_many_arguments)]
    pub fn write(
        &self,
        index: usize,
        codec: &dyn SampleFileCodec,
        path: &Path,
        header_format: HeaderFormat,
        sample_format: SampleFormat,
        start_frame: usize,
        frames: Option<usize>,
    ) -> Result<(), BufferError> {
        self.check_in_use(index)?;
        match &self.slots[index] {
            Slot::Allocated(buffer) => buffer.write_file(
                codec,
                path,
                header_format,
                sample_format,
                start_frame,
                frames,
            ),
            Slot::Free => unreachable!("check_in_use guards the Free arm"),
        }
    }

    /// Read access for the render path. No error machinery: a Free slot
    /// reads as `None`.
    pub fn get(&self, index: usize) -> Option<&SampleBuffer> {
        match self.slots.get(index) {
            Some(Slot::Allocated(buffer)) => Some(buffer),
            _ => None,
        }
    }

    fn buffer_mut(&mut self, index: usize) -> Result<&mut SampleBuffer, BufferError> {
        debug_assert!(index < self.slots.len());
        match &mut self.slots[index] {
            Slot::Allocated(buffer) => Ok(buffer),
            Slot::Free => Err(BufferError::NotInUse { index }),
        }
    }
}
