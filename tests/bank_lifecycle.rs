//! Integration tests for the buffer engine
//!
//! These tests drive the full control path: commands submitted through the
//! SPSC queue, executed by the table worker, outcomes drained on the control
//! surface, and staged frees reclaimed at the render barrier. File-backed
//! operations run against real WAV files in a temp directory.

use samplebank::codec::{EncodeRequest, HeaderFormat, SampleFileCodec, SampleFormat, WavCodec};
use samplebank::config::ControlConfig;
use samplebank::control::{BufferCommand, CommandOutcome, TableWorker};
use samplebank::error::BufferError;
use samplebank::SampleTable;

fn drive(
    capacity: usize,
    commands: Vec<BufferCommand>,
) -> (TableWorker, Vec<CommandOutcome>) {
    let (mut worker, mut sender, mut outcomes, barrier) = TableWorker::new(
        SampleTable::new(capacity),
        Box::new(WavCodec),
        &ControlConfig::default(),
    );

    for command in commands {
        sender.submit(command).expect("queue should not overflow");
    }
    worker.process_pending();
    barrier.complete_block();
    worker.reclaim();

    let results = outcomes.drain();
    (worker, results)
}

/// Capacity-4 manager scenario: double allocation of a slot fails with
/// "already in use", and freeing makes the slot allocatable again.
#[test]
fn test_allocate_free_allocate_scenario() {
    let (worker, results) = drive(
        4,
        vec![
            BufferCommand::Allocate {
                index: 0,
                frames: 512,
                channels: 2,
                sample_rate: 48_000,
            },
            BufferCommand::Allocate {
                index: 0,
                frames: 256,
                channels: 1,
                sample_rate: 48_000,
            },
            BufferCommand::Free { index: 0 },
            BufferCommand::Allocate {
                index: 0,
                frames: 256,
                channels: 1,
                sample_rate: 48_000,
            },
        ],
    );

    assert!(results[0].result.is_ok(), "first allocation should succeed");
    assert!(
        matches!(results[1].result, Err(BufferError::AlreadyInUse { index: 0 })),
        "second allocation should fail with already-in-use"
    );
    assert!(results[2].result.is_ok(), "free should succeed");
    assert!(
        results[3].result.is_ok(),
        "allocation after free should succeed"
    );
    assert_eq!(worker.table().get(0).unwrap().frames(), 256);
}

/// A freed slot is indistinguishable from a never-used one.
#[test]
fn test_free_returns_slot_to_initial_state() {
    let (worker, results) = drive(
        2,
        vec![
            BufferCommand::Allocate {
                index: 1,
                frames: 64,
                channels: 2,
                sample_rate: 44_100,
            },
            BufferCommand::Free { index: 1 },
        ],
    );

    assert!(results.iter().all(|o| o.result.is_ok()));
    assert!(worker.table().get(1).is_none());
    assert!(worker.table().check_unused(1).is_ok());
    assert!(matches!(
        worker.table().check_in_use(1),
        Err(BufferError::NotInUse { index: 1 })
    ));
}

/// The 512-frame fill scenario: fill(500, 100, 1.0) writes exactly 12
/// samples and leaves everything below untouched.
#[test]
fn test_fill_clamp_scenario() {
    let (worker, results) = drive(
        1,
        vec![
            BufferCommand::Allocate {
                index: 0,
                frames: 512,
                channels: 1,
                sample_rate: 48_000,
            },
            BufferCommand::Zero { index: 0 },
            BufferCommand::Fill {
                index: 0,
                position: 500,
                count: 100,
                value: 1.0,
            },
        ],
    );

    assert!(results.iter().all(|o| o.result.is_ok()));
    let samples = worker.table().get(0).unwrap().samples();
    assert!(samples[500..512].iter().all(|&s| s == 1.0));
    assert!(samples[..500].iter().all(|&s| s == 0.0));
}

/// Scatter writes drop out-of-range indices without disturbing the rest.
#[test]
fn test_scatter_command() {
    let (worker, results) = drive(
        1,
        vec![
            BufferCommand::Allocate {
                index: 0,
                frames: 16,
                channels: 1,
                sample_rate: 48_000,
            },
            BufferCommand::Zero { index: 0 },
            BufferCommand::SetScatter {
                index: 0,
                writes: vec![(0, 0.1), (15, 0.2), (16, 9.0), (99, 9.0)],
            },
        ],
    );

    assert!(results.iter().all(|o| o.result.is_ok()));
    let samples = worker.table().get(0).unwrap().samples();
    assert_eq!(samples[0], 0.1);
    assert_eq!(samples[15], 0.2);
    assert!(samples.iter().all(|&s| s != 9.0));
}

/// Write a buffer's frames to disk, read them back into a fresh slot, and
/// compare within int16 quantization.
#[test]
fn test_write_read_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("roundtrip.wav");

    let values: Vec<f32> = (0..256)
        .map(|i| ((i as f32) / 256.0 * std::f32::consts::TAU).sin() * 0.8)
        .collect();

    let (worker, results) = drive(
        2,
        vec![
            BufferCommand::Allocate {
                index: 0,
                frames: 256,
                channels: 1,
                sample_rate: 48_000,
            },
            BufferCommand::SetContiguous {
                index: 0,
                position: 0,
                values: values.clone(),
            },
            BufferCommand::Write {
                index: 0,
                path: path.clone(),
                header_format: HeaderFormat::Wav,
                sample_format: SampleFormat::Int16,
                start_frame: 0,
                frames: None,
            },
            BufferCommand::ReadAllocate {
                index: 1,
                path: path.clone(),
                start_frame: 0,
                frames: None,
            },
        ],
    );

    for outcome in &results {
        assert!(
            outcome.result.is_ok(),
            "{} failed: {:?}",
            outcome.label,
            outcome.result
        );
    }

    let restored = worker.table().get(1).unwrap();
    assert_eq!(restored.frames(), 256);
    assert_eq!(restored.channels(), 1);
    for (original, sample) in values.iter().zip(restored.samples().iter()) {
        assert!(
            (original - sample).abs() < 1.0 / 16_384.0,
            "{} decoded as {}",
            original,
            sample
        );
    }
}

/// Reading a missing file reports a codec error and leaves the slot free.
#[test]
fn test_failed_read_leaves_slot_unallocated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.wav");

    let (worker, results) = drive(
        1,
        vec![BufferCommand::ReadAllocate {
            index: 0,
            path,
            start_frame: 0,
            frames: None,
        }],
    );

    assert!(
        matches!(results[0].result, Err(BufferError::File(_))),
        "expected a codec error, got {:?}",
        results[0].result
    );
    assert!(worker.table().get(0).is_none());
    assert!(worker.table().check_unused(0).is_ok());
}

/// Channel-subset read picks out one channel of a stereo file.
#[test]
fn test_read_allocate_channels() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("stereo.wav");

    // Stereo source: left ramps up, right stays at -0.5.
    let frames = 32;
    let interleaved: Vec<f32> = (0..frames)
        .flat_map(|i| [i as f32 / frames as f32, -0.5])
        .collect();
    WavCodec
        .write(
            &path,
            &EncodeRequest {
                samples: &interleaved,
                channels: 2,
                sample_rate: 48_000,
                header_format: HeaderFormat::Wav,
                sample_format: SampleFormat::Float32,
            },
        )
        .expect("writing the stereo source should succeed");

    let (worker, results) = drive(
        1,
        vec![BufferCommand::ReadAllocateChannels {
            index: 0,
            path,
            start_frame: 0,
            frames: None,
            channels: vec![1],
        }],
    );

    assert!(
        results[0].result.is_ok(),
        "subset read failed: {:?}",
        results[0].result
    );
    let mono = worker.table().get(0).unwrap();
    assert_eq!(mono.channels(), 1);
    assert_eq!(mono.frames(), frames);
    assert!(
        mono.samples().iter().all(|&s| (s + 0.5).abs() < 1e-6),
        "only the right channel should have been kept"
    );
}

/// Commands parsed from a JSON script execute like natively built ones.
#[test]
fn test_json_script_execution() {
    let script = r#"[
        {"op": "allocate", "index": 0, "frames": 128, "channels": 1},
        {"op": "zero", "index": 0},
        {"op": "fill", "index": 0, "position": 0, "count": 128, "value": 0.25},
        {"op": "free", "index": 0}
    ]"#;
    let commands: Vec<BufferCommand> =
        serde_json::from_str(script).expect("script should parse");

    let (worker, results) = drive(1, commands);
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|o| o.result.is_ok()));
    assert!(worker.table().get(0).is_none());
}
