//! A single allocated audio buffer.
//!
//! A `SampleBuffer` always owns aligned storage: construction is allocation
//! and drop is release, so a buffer in the wrong allocation state cannot be
//! expressed. The "unallocated" state of a table position lives in the slot
//! tag, not here. Storage is interleaved (frame-major).

use std::path::Path;

use crate::alloc::SampleStorage;
use crate::codec::{DecodedAudio, EncodeRequest, HeaderFormat, SampleFileCodec, SampleFormat};
use crate::error::BufferError;

pub struct SampleBuffer {
    storage: SampleStorage,
    frames: usize,
    channels: usize,
    sample_rate: u32,
}

impl SampleBuffer {
    /// Allocate aligned, uninitialized storage for `frames * channels`
    /// samples. Contents are not zeroed; call [`SampleBuffer::zero`] for
    /// silence.
    pub fn allocate(
        frames: usize,
        channels: usize,
        sample_rate: u32,
    ) -> Result<Self, BufferError> {
        let total = frames
            .checked_mul(channels)
            .ok_or(BufferError::AllocationFailed { frames, channels })?;
        let storage =
            SampleStorage::new(total).ok_or(BufferError::AllocationFailed { frames, channels })?;
        Ok(Self {
            storage,
            frames,
            channels,
            sample_rate,
        })
    }

    /// Decode a frame range from `path` into a freshly allocated buffer.
    ///
    /// On any codec error no buffer exists; a partially populated buffer is
    /// not observable.
    pub fn read_file(
        codec: &dyn SampleFileCodec,
        path: &Path,
        start_frame: usize,
        frames: Option<usize>,
    ) -> Result<Self, BufferError> {
        let decoded = codec.read(path, start_frame, frames)?;
        Self::from_decoded(decoded)
    }

    /// Like [`SampleBuffer::read_file`], restricted to the given source
    /// channels.
    pub fn read_file_channels(
        codec: &dyn SampleFileCodec,
        path: &Path,
        start_frame: usize,
        frames: Option<usize>,
        channels: &[usize],
    ) -> Result<Self, BufferError> {
        let decoded = codec.read_channels(path, start_frame, frames, channels)?;
        Self::from_decoded(decoded)
    }

    fn from_decoded(decoded: DecodedAudio) -> Result<Self, BufferError> {
        let frames = decoded.frame_count();
        let channels = decoded.channels;
        let mut storage = SampleStorage::new(decoded.samples.len())
            .ok_or(BufferError::AllocationFailed { frames, channels })?;
        storage.as_mut_slice().copy_from_slice(&decoded.samples);
        Ok(Self {
            storage,
            frames,
            channels,
            sample_rate: decoded.sample_rate,
        })
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Total samples, `frames * channels`.
    pub fn sample_count(&self) -> usize {
        self.storage.len()
    }

    pub fn samples(&self) -> &[f32] {
        self.storage.as_slice()
    }

    pub fn samples_mut(&mut self) -> &mut [f32] {
        self.storage.as_mut_slice()
    }

    /// Fill the whole buffer with silence.
    pub fn zero(&mut self) {
        self.storage.as_mut_slice().fill(0.0);
    }

    /// Scatter write: each `(index, value)` pair lands at `index` in the
    /// interleaved sample array if `index < frames`; out-of-range indices
    /// are dropped without error. Malformed remote input must never fault
    /// the server.
    pub fn set_samples_at(&mut self, writes: &[(usize, f32)]) {
        let data = self.storage.as_mut_slice();
        let limit = self.frames.min(data.len());
        for &(index, value) in writes {
            if index < limit {
                data[index] = value;
            }
        }
    }

    /// Contiguous write of `values` starting at `position`. The write count
    /// is clamped to the samples available at `position`; positions at or
    /// past `frames` write nothing. Returns the number of samples written.
    pub fn set_samples(&mut self, position: usize, values: &[f32]) -> usize {
        let data = self.storage.as_mut_slice();
        let available = self.frames.min(data.len()).saturating_sub(position);
        let count = values.len().min(available);
        data[position..position + count].copy_from_slice(&values[..count]);
        count
    }

    /// Broadcast `value` over `count` samples starting at `position`, with
    /// the same clamp as [`SampleBuffer::set_samples`]. Returns the number
    /// of samples written.
    pub fn fill_samples(&mut self, position: usize, count: usize, value: f32) -> usize {
        let data = self.storage.as_mut_slice();
        let available = self.frames.min(data.len()).saturating_sub(position);
        let count = count.min(available);
        data[position..position + count].fill(value);
        count
    }

    /// Encode a frame range of this buffer to `path`. Does not mutate the
    /// buffer. The range is clamped to the frames actually present.
    pub fn write_file(
        &self,
        codec: &dyn SampleFileCodec,
        path: &Path,
        header_format: HeaderFormat,
        sample_format: SampleFormat,
        start_frame: usize,
        frames: Option<usize>,
    ) -> Result<(), BufferError> {
        let available = self.frames.saturating_sub(start_frame);
        let count = frames.unwrap_or(available).min(available);
        let begin = (start_frame * self.channels).min(self.storage.len());
        let end = (begin + count * self.channels).min(self.storage.len());
        let samples = &self.storage.as_slice()[begin..end];

        codec
            .write(
                path,
                &EncodeRequest {
                    samples,
                    channels: self.channels,
                    sample_rate: self.sample_rate,
                    header_format,
                    sample_format,
                },
            )
            .map_err(BufferError::File)
    }
}

impl std::fmt::Debug for SampleBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleBuffer")
            .field("frames", &self.frames)
            .field("channels", &self.channels)
            .field("sample_rate", &self.sample_rate)
            .finish()
    }
}
