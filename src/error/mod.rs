// Error types for the sample buffer engine
//
// Buffer operations report structured errors with numeric codes so the
// command dispatcher can relay them to remote callers verbatim.

mod buffer;

pub use buffer::{log_buffer_error, BufferError, BufferErrorCodes};

/// Error codes for structured error reporting
///
/// This trait provides a standard way to get error codes and messages from
/// custom error types, enabling consistent reporting across the command
/// surface.
pub trait ErrorCode {
    /// Get the numeric error code
    fn code(&self) -> i32;

    /// Get the human-readable error message
    fn message(&self) -> String;
}
