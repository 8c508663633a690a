//! Command intake, execution, and staged release.
//!
//! `TableWorker` is the table's only writer. Commands flow in over one SPSC
//! ring, outcomes flow back over another, and neither endpoint ever blocks:
//! a full intake queue is reported to the submitter, a full outcome queue
//! drops the oldest information with a warning rather than stalling the
//! worker.

use rtrb::{Consumer, Producer, RingBuffer};

use crate::buffer::{SampleBuffer, SampleTable};
use crate::codec::SampleFileCodec;
use crate::config::ControlConfig;
use crate::control::barrier::ReleaseBarrier;
use crate::control::command::BufferCommand;
use crate::error::BufferError;

struct SequencedCommand {
    seq: u64,
    command: BufferCommand,
}

/// Result of one executed command, reported back to the control surface.
#[derive(Debug)]
pub struct CommandOutcome {
    /// Sequence number assigned by [`CommandSender::submit`].
    pub seq: u64,
    /// Operation name, see [`BufferCommand::label`].
    pub label: &'static str,
    /// The table index the command addressed.
    pub index: usize,
    pub result: Result<(), BufferError>,
}

/// The intake queue rejected a command because it is full. The command is
/// handed back untouched for the caller to retry or drop.
#[derive(Debug)]
pub struct QueueFull(pub BufferCommand);

impl std::fmt::Display for QueueFull {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "command queue full, rejected {}", self.0.label())
    }
}

impl std::error::Error for QueueFull {}

/// Control-surface handle: submits commands, never blocks.
pub struct CommandSender {
    producer: Producer<SequencedCommand>,
    next_seq: u64,
}

impl CommandSender {
    /// Enqueue a command; returns its sequence number.
    pub fn submit(&mut self, command: BufferCommand) -> Result<u64, QueueFull> {
        let seq = self.next_seq;
        match self.producer.push(SequencedCommand { seq, command }) {
            Ok(()) => {
                self.next_seq += 1;
                Ok(seq)
            }
            Err(rtrb::PushError::Full(rejected)) => Err(QueueFull(rejected.command)),
        }
    }
}

/// Control-surface handle for collecting command outcomes.
pub struct OutcomeReceiver {
    consumer: Consumer<CommandOutcome>,
}

impl OutcomeReceiver {
    /// Next outcome, if one is ready.
    pub fn poll(&mut self) -> Option<CommandOutcome> {
        self.consumer.pop().ok()
    }

    /// Drain every ready outcome.
    pub fn drain(&mut self) -> Vec<CommandOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(outcome) = self.consumer.pop() {
            outcomes.push(outcome);
        }
        outcomes
    }
}

struct StagedRelease {
    /// Barrier count observed when the buffer was detached.
    epoch: u64,
    buffer: SampleBuffer,
}

/// Single writer of the buffer table.
///
/// Owns the table, the codec, and the staged-release list. Driven by calling
/// [`TableWorker::process_pending`] from the control thread; the render path
/// only ever touches the shared [`ReleaseBarrier`].
pub struct TableWorker {
    table: SampleTable,
    codec: Box<dyn SampleFileCodec + Send>,
    intake: Consumer<SequencedCommand>,
    outcomes: Producer<CommandOutcome>,
    staged: Vec<StagedRelease>,
    barrier: ReleaseBarrier,
}

impl TableWorker {
    /// Wire up a worker around `table`, returning the control-surface
    /// handles and the barrier to hand to the render path.
    pub fn new(
        table: SampleTable,
        codec: Box<dyn SampleFileCodec + Send>,
        config: &ControlConfig,
    ) -> (Self, CommandSender, OutcomeReceiver, ReleaseBarrier) {
        let (command_producer, command_consumer) =
            RingBuffer::new(config.command_queue_depth);
        let (outcome_producer, outcome_consumer) = RingBuffer::new(config.outcome_queue_depth);
        let barrier = ReleaseBarrier::new();

        let worker = Self {
            table,
            codec,
            intake: command_consumer,
            outcomes: outcome_producer,
            staged: Vec::new(),
            barrier: barrier.clone(),
        };
        let sender = CommandSender {
            producer: command_producer,
            next_seq: 0,
        };
        let receiver = OutcomeReceiver {
            consumer: outcome_consumer,
        };
        (worker, sender, receiver, barrier)
    }

    pub fn table(&self) -> &SampleTable {
        &self.table
    }

    /// Number of detached buffers awaiting reclaim.
    pub fn staged_len(&self) -> usize {
        self.staged.len()
    }

    /// Drain the intake queue, executing each command against the table and
    /// reporting an outcome. Returns the number of commands handled.
    ///
    /// Errors are reported and logged, never fatal: a rejected command must
    /// not take the server down.
    pub fn process_pending(&mut self) -> usize {
        self.reclaim();

        let mut handled = 0;
        while let Ok(SequencedCommand { seq, command }) = self.intake.pop() {
            let label = command.label();
            let index = command.index();
            let result = self.execute(command);
            if let Err(err) = &result {
                tracing::warn!(
                    "[TableWorker] {} on buffer {} failed: {}",
                    label, index, err
                );
            }
            if self
                .outcomes
                .push(CommandOutcome {
                    seq,
                    label,
                    index,
                    result,
                })
                .is_err()
            {
                tracing::warn!(
                    "[TableWorker] outcome queue full, dropping result for seq {}",
                    seq
                );
            }
            handled += 1;
        }

        self.reclaim();
        handled
    }

    /// Drop staged storage from before the last completed render block.
    /// Storage detached during block N is held until the render path has
    /// called [`ReleaseBarrier::complete_block`] past it.
    pub fn reclaim(&mut self) -> usize {
        let completed = self.barrier.completed();
        let before = self.staged.len();
        self.staged.retain(|staged| staged.epoch >= completed);
        before - self.staged.len()
    }

    fn execute(&mut self, command: BufferCommand) -> Result<(), BufferError> {
        let index = command.index();
        if index >= self.table.capacity() {
            return Err(BufferError::IndexOutOfRange {
                index,
                capacity: self.table.capacity(),
            });
        }

        match command {
            BufferCommand::Allocate {
                index,
                frames,
                channels,
                sample_rate,
            } => self.table.allocate(index, frames, channels, sample_rate),
            BufferCommand::ReadAllocate {
                index,
                path,
                start_frame,
                frames,
            } => self
                .table
                .read_allocate(index, self.codec.as_ref(), &path, start_frame, frames),
            BufferCommand::ReadAllocateChannels {
                index,
                path,
                start_frame,
                frames,
                channels,
            } => self.table.read_allocate_channels(
                index,
                self.codec.as_ref(),
                &path,
                start_frame,
                frames,
                &channels,
            ),
            BufferCommand::Free { index } => {
                let buffer = self.table.free(index)?;
                self.stage(buffer);
                Ok(())
            }
            BufferCommand::Zero { index } => self.table.zero(index),
            BufferCommand::SetScatter { index, writes } => {
                self.table.set_samples_at(index, &writes)
            }
            BufferCommand::SetContiguous {
                index,
                position,
                values,
            } => self.table.set_samples(index, position, &values).map(|_| ()),
            BufferCommand::Fill {
                index,
                position,
                count,
                value,
            } => self
                .table
                .fill_samples(index, position, count, value)
                .map(|_| ()),
            BufferCommand::Write {
                index,
                path,
                header_format,
                sample_format,
                start_frame,
                frames,
            } => self.table.write(
                index,
                self.codec.as_ref(),
                &path,
                header_format,
                sample_format,
                start_frame,
                frames,
            ),
        }
    }

    fn stage(&mut self, buffer: SampleBuffer) {
        self.staged.push(StagedRelease {
            epoch: self.barrier.completed(),
            buffer,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::WavCodec;
    use crate::config::ControlConfig;

    fn test_worker(
        capacity: usize,
    ) -> (TableWorker, CommandSender, OutcomeReceiver, ReleaseBarrier) {
        TableWorker::new(
            SampleTable::new(capacity),
            Box::new(WavCodec),
            &ControlConfig::default(),
        )
    }

    #[test]
    fn test_commands_execute_in_submission_order() {
        let (mut worker, mut sender, mut outcomes, _barrier) = test_worker(4);

        sender
            .submit(BufferCommand::Allocate {
                index: 0,
                frames: 512,
                channels: 2,
                sample_rate: 48_000,
            })
            .unwrap();
        sender.submit(BufferCommand::Zero { index: 0 }).unwrap();
        sender
            .submit(BufferCommand::Fill {
                index: 0,
                position: 500,
                count: 100,
                value: 1.0,
            })
            .unwrap();

        assert_eq!(worker.process_pending(), 3);

        let results = outcomes.drain();
        assert_eq!(results.len(), 3);
        assert_eq!(
            results.iter().map(|o| o.seq).collect::<Vec<_>>(),
            vec![0, 1, 2],
            "outcomes should preserve submission order"
        );
        assert!(results.iter().all(|o| o.result.is_ok()));
        assert_eq!(results[2].label, "fill");
    }

    #[test]
    fn test_state_violation_is_reported_not_fatal() {
        let (mut worker, mut sender, mut outcomes, _barrier) = test_worker(4);

        sender
            .submit(BufferCommand::Allocate {
                index: 0,
                frames: 512,
                channels: 2,
                sample_rate: 48_000,
            })
            .unwrap();
        // Wrong state: slot 0 is now in use.
        sender
            .submit(BufferCommand::Allocate {
                index: 0,
                frames: 256,
                channels: 1,
                sample_rate: 48_000,
            })
            .unwrap();
        // The worker keeps going afterwards.
        sender.submit(BufferCommand::Zero { index: 0 }).unwrap();

        worker.process_pending();
        let results = outcomes.drain();
        assert!(results[0].result.is_ok());
        assert!(matches!(
            results[1].result,
            Err(BufferError::AlreadyInUse { index: 0 })
        ));
        assert!(
            results[2].result.is_ok(),
            "a failed command must not stop later commands"
        );
        // The original 512-frame buffer is untouched.
        assert_eq!(worker.table().get(0).unwrap().frames(), 512);
    }

    #[test]
    fn test_index_out_of_range_is_rejected() {
        let (mut worker, mut sender, mut outcomes, _barrier) = test_worker(2);

        sender.submit(BufferCommand::Zero { index: 9 }).unwrap();
        worker.process_pending();

        let results = outcomes.drain();
        assert!(matches!(
            results[0].result,
            Err(BufferError::IndexOutOfRange {
                index: 9,
                capacity: 2
            })
        ));
    }

    #[test]
    fn test_free_stages_until_render_barrier() {
        let (mut worker, mut sender, mut outcomes, barrier) = test_worker(2);

        sender
            .submit(BufferCommand::Allocate {
                index: 0,
                frames: 64,
                channels: 1,
                sample_rate: 48_000,
            })
            .unwrap();
        sender.submit(BufferCommand::Free { index: 0 }).unwrap();
        worker.process_pending();
        assert!(outcomes.drain().iter().all(|o| o.result.is_ok()));

        // Slot free for the state machine, storage still staged.
        assert!(worker.table().get(0).is_none());
        assert_eq!(worker.staged_len(), 1);

        // No barrier passed yet: reclaim must hold the storage.
        assert_eq!(worker.reclaim(), 0);
        assert_eq!(worker.staged_len(), 1);

        // Render path finishes the block; now the storage goes.
        barrier.complete_block();
        assert_eq!(worker.reclaim(), 1);
        assert_eq!(worker.staged_len(), 0);
    }

    #[test]
    fn test_slot_is_reusable_while_storage_is_staged() {
        let (mut worker, mut sender, mut outcomes, _barrier) = test_worker(2);

        for command in [
            BufferCommand::Allocate {
                index: 0,
                frames: 64,
                channels: 1,
                sample_rate: 48_000,
            },
            BufferCommand::Free { index: 0 },
            BufferCommand::Allocate {
                index: 0,
                frames: 32,
                channels: 2,
                sample_rate: 48_000,
            },
        ] {
            sender.submit(command).unwrap();
        }
        worker.process_pending();

        assert!(outcomes.drain().iter().all(|o| o.result.is_ok()));
        assert_eq!(worker.table().get(0).unwrap().frames(), 32);
        assert_eq!(worker.staged_len(), 1, "old storage still awaiting the barrier");
    }

    #[test]
    fn test_queue_full_hands_the_command_back() {
        let config = ControlConfig {
            command_queue_depth: 1,
            outcome_queue_depth: 1,
        };
        let (_worker, mut sender, _outcomes, _barrier) =
            TableWorker::new(SampleTable::new(1), Box::new(WavCodec), &config);

        sender.submit(BufferCommand::Zero { index: 0 }).unwrap();
        let rejected = sender
            .submit(BufferCommand::Free { index: 0 })
            .expect_err("second submit should overflow the 1-deep queue");
        assert_eq!(rejected.0.label(), "free");
    }
}
