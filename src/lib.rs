// samplebank - sample buffer engine for a real-time audio synthesis server
// Aligned sample storage and an indexed buffer table fed by a lock-free command pipeline

// Module declarations
pub mod alloc;
pub mod buffer;
pub mod codec;
pub mod config;
pub mod control;
pub mod error;

// Re-exports for convenience
pub use buffer::{SampleBuffer, SampleTable};
pub use codec::{SampleFileCodec, WavCodec};
pub use config::BankConfig;
pub use control::{BufferCommand, CommandSender, OutcomeReceiver, ReleaseBarrier, TableWorker};
pub use error::{BufferError, ErrorCode};
