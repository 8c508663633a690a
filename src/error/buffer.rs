// Buffer error types and constants

use crate::codec::FileError;
use crate::error::ErrorCode;
use log::error;
use std::fmt;

/// Buffer error code constants shared with the command dispatcher
///
/// Error code range: 2001-2005
pub struct BufferErrorCodes {}

impl BufferErrorCodes {
    /// Slot already holds an allocated buffer
    pub const ALREADY_IN_USE: i32 = 2001;

    /// Slot holds no allocated buffer
    pub const NOT_IN_USE: i32 = 2002;

    /// Aligned allocation returned no block
    pub const ALLOCATION_FAILED: i32 = 2003;

    /// Buffer index outside the table
    pub const INDEX_OUT_OF_RANGE: i32 = 2004;

    /// Sound-file codec failure
    pub const FILE: i32 = 2005;
}

/// Log a buffer error with structured context
pub fn log_buffer_error(err: &BufferError, context: &str) {
    error!(
        "Buffer error in {}: code={}, message={}",
        context,
        err.code(),
        err.message()
    );
}

/// Buffer table errors
///
/// State violations and allocation failures are recoverable: the dispatcher
/// reports them to the remote caller and the server keeps running. Codec
/// failures carry the underlying [`FileError`].
#[derive(Debug, Clone, PartialEq)]
pub enum BufferError {
    /// Slot already holds an allocated buffer
    AlreadyInUse { index: usize },

    /// Slot holds no allocated buffer
    NotInUse { index: usize },

    /// Aligned allocation returned no block
    AllocationFailed { frames: usize, channels: usize },

    /// Buffer index outside the table
    IndexOutOfRange { index: usize, capacity: usize },

    /// Sound-file codec failure
    File(FileError),
}

impl ErrorCode for BufferError {
    fn code(&self) -> i32 {
        match self {
            BufferError::AlreadyInUse { .. } => BufferErrorCodes::ALREADY_IN_USE,
            BufferError::NotInUse { .. } => BufferErrorCodes::NOT_IN_USE,
            BufferError::AllocationFailed { .. } => BufferErrorCodes::ALLOCATION_FAILED,
            BufferError::IndexOutOfRange { .. } => BufferErrorCodes::INDEX_OUT_OF_RANGE,
            BufferError::File(_) => BufferErrorCodes::FILE,
        }
    }

    fn message(&self) -> String {
        match self {
            BufferError::AlreadyInUse { index } => {
                format!("buffer {} already in use", index)
            }
            BufferError::NotInUse { index } => {
                format!("buffer {} is not in use", index)
            }
            BufferError::AllocationFailed { frames, channels } => {
                format!(
                    "could not allocate buffer ({} frames, {} channels)",
                    frames, channels
                )
            }
            BufferError::IndexOutOfRange { index, capacity } => {
                format!("buffer index {} out of range (table holds {})", index, capacity)
            }
            BufferError::File(err) => err.to_string(),
        }
    }
}

impl fmt::Display for BufferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for BufferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BufferError::File(err) => Some(err),
            _ => None,
        }
    }
}

impl From<FileError> for BufferError {
    fn from(err: FileError) -> Self {
        BufferError::File(err)
    }
}
