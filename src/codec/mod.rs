// Sound-file codec seam
//
// The buffer table never touches containers or sample encodings directly; it
// goes through `SampleFileCodec`. The shipped implementation is WAV via
// hound, but anything that can decode a frame range to interleaved f32 and
// encode one back satisfies the trait.

mod wav;

pub use wav::WavCodec;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Failures surfaced by a codec. Never swallowed by callers; a failed read
/// leaves the target buffer unallocated.
#[derive(Debug, Clone, PartialEq)]
pub enum FileError {
    /// The path does not exist.
    NotFound { path: String },
    /// The container or sample encoding cannot be handled.
    UnsupportedFormat { details: String },
    /// The file ended before the requested frame range.
    TruncatedData { details: String },
    /// Underlying I/O failure other than a missing file.
    Io { details: String },
    /// Failure while encoding or finalizing an output file.
    Encode { details: String },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::NotFound { path } => write!(f, "sound file not found: {}", path),
            FileError::UnsupportedFormat { details } => {
                write!(f, "unsupported sound file format: {}", details)
            }
            FileError::TruncatedData { details } => {
                write!(f, "sound file truncated: {}", details)
            }
            FileError::Io { details } => write!(f, "sound file i/o error: {}", details),
            FileError::Encode { details } => write!(f, "sound file encode error: {}", details),
        }
    }
}

impl std::error::Error for FileError {}

/// Container format for [`SampleFileCodec::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeaderFormat {
    Wav,
}

impl FromStr for HeaderFormat {
    type Err = FileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "wav" | "wave" => Ok(HeaderFormat::Wav),
            other => Err(FileError::UnsupportedFormat {
                details: format!("unknown header format '{}'", other),
            }),
        }
    }
}

/// On-disk sample encoding for [`SampleFileCodec::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    Int16,
    Int24,
    Int32,
    Float32,
}

impl SampleFormat {
    pub fn bits_per_sample(self) -> u16 {
        match self {
            SampleFormat::Int16 => 16,
            SampleFormat::Int24 => 24,
            SampleFormat::Int32 => 32,
            SampleFormat::Float32 => 32,
        }
    }
}

impl FromStr for SampleFormat {
    type Err = FileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "int16" | "pcm16" => Ok(SampleFormat::Int16),
            "int24" | "pcm24" => Ok(SampleFormat::Int24),
            "int32" | "pcm32" => Ok(SampleFormat::Int32),
            "float" | "float32" => Ok(SampleFormat::Float32),
            other => Err(FileError::UnsupportedFormat {
                details: format!("unknown sample format '{}'", other),
            }),
        }
    }
}

/// Interleaved decode result.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Interleaved samples, exactly `frame_count() * channels` long.
    pub samples: Vec<f32>,
    pub channels: usize,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn frame_count(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.samples.len() / self.channels
        }
    }
}

/// Encode request handed to [`SampleFileCodec::write`].
#[derive(Debug)]
pub struct EncodeRequest<'a> {
    /// Interleaved source samples, a whole number of frames.
    pub samples: &'a [f32],
    pub channels: usize,
    pub sample_rate: u32,
    pub header_format: HeaderFormat,
    pub sample_format: SampleFormat,
}

/// Decode/encode collaborator for file-backed buffer operations.
///
/// All methods may block on the filesystem and must only run on the control
/// path.
pub trait SampleFileCodec {
    /// Decode `frames` frames starting at `start_frame`; `None` means the
    /// rest of the file.
    fn read(
        &self,
        path: &Path,
        start_frame: usize,
        frames: Option<usize>,
    ) -> Result<DecodedAudio, FileError>;

    /// Like [`SampleFileCodec::read`], restricted to the given source
    /// channels, in the order requested.
    fn read_channels(
        &self,
        path: &Path,
        start_frame: usize,
        frames: Option<usize>,
        channels: &[usize],
    ) -> Result<DecodedAudio, FileError>;

    /// Encode the request to `path`.
    fn write(&self, path: &Path, request: &EncodeRequest<'_>) -> Result<(), FileError>;
}
