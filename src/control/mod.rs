// Control module - the single-writer command pipeline feeding the table
//
// Mutating buffer operations arrive as commands on a lock-free SPSC queue
// and are executed by one worker, so the table only ever has a single
// writer. Freed storage is staged and reclaimed only after the render path
// reports a completed block, closing the use-after-free window between an
// immediate free and an in-flight render read.

pub mod barrier;
pub mod command;
pub mod worker;

// Re-export commonly used types for convenience
pub use barrier::ReleaseBarrier;
pub use command::BufferCommand;
pub use worker::{
    CommandOutcome, CommandSender, OutcomeReceiver, QueueFull, TableWorker,
};
