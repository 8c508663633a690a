//! The buffer command surface.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::codec::{HeaderFormat, SampleFormat};

fn default_sample_rate() -> u32 {
    48_000
}

/// One buffer operation addressed at a table index.
///
/// Commands serialize as tagged JSON objects so dispatchers and script
/// harnesses can construct them directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum BufferCommand {
    /// Allocate uninitialized storage.
    Allocate {
        index: usize,
        frames: usize,
        channels: usize,
        #[serde(default = "default_sample_rate")]
        sample_rate: u32,
    },
    /// Allocate from a sound file.
    ReadAllocate {
        index: usize,
        path: PathBuf,
        #[serde(default)]
        start_frame: usize,
        #[serde(default)]
        frames: Option<usize>,
    },
    /// Allocate from a channel subset of a sound file.
    ReadAllocateChannels {
        index: usize,
        path: PathBuf,
        #[serde(default)]
        start_frame: usize,
        #[serde(default)]
        frames: Option<usize>,
        channels: Vec<usize>,
    },
    /// Detach the buffer; storage is reclaimed after the next render barrier.
    Free { index: usize },
    /// Fill with silence.
    Zero { index: usize },
    /// Scatter write of (index, value) pairs.
    SetScatter {
        index: usize,
        writes: Vec<(usize, f32)>,
    },
    /// Contiguous write starting at `position`.
    SetContiguous {
        index: usize,
        #[serde(default)]
        position: usize,
        values: Vec<f32>,
    },
    /// Broadcast a value over a sample range.
    Fill {
        index: usize,
        #[serde(default)]
        position: usize,
        count: usize,
        value: f32,
    },
    /// Encode a frame range to a sound file.
    Write {
        index: usize,
        path: PathBuf,
        header_format: HeaderFormat,
        sample_format: SampleFormat,
        #[serde(default)]
        start_frame: usize,
        #[serde(default)]
        frames: Option<usize>,
    },
}

impl BufferCommand {
    /// The table index this command addresses.
    pub fn index(&self) -> usize {
        match self {
            BufferCommand::Allocate { index, .. }
            | BufferCommand::ReadAllocate { index, .. }
            | BufferCommand::ReadAllocateChannels { index, .. }
            | BufferCommand::Free { index }
            | BufferCommand::Zero { index }
            | BufferCommand::SetScatter { index, .. }
            | BufferCommand::SetContiguous { index, .. }
            | BufferCommand::Fill { index, .. }
            | BufferCommand::Write { index, .. } => *index,
        }
    }

    /// Stable operation name for outcomes and logs.
    pub fn label(&self) -> &'static str {
        match self {
            BufferCommand::Allocate { .. } => "allocate",
            BufferCommand::ReadAllocate { .. } => "read_allocate",
            BufferCommand::ReadAllocateChannels { .. } => "read_allocate_channels",
            BufferCommand::Free { .. } => "free",
            BufferCommand::Zero { .. } => "zero",
            BufferCommand::SetScatter { .. } => "set_scatter",
            BufferCommand::SetContiguous { .. } => "set_contiguous",
            BufferCommand::Fill { .. } => "fill",
            BufferCommand::Write { .. } => "write",
        }
    }
}
