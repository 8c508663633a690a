use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use samplebank::codec::{HeaderFormat, SampleFormat, WavCodec};
use samplebank::config::BankConfig;
use samplebank::control::{BufferCommand, TableWorker};
use samplebank::error::ErrorCode;
use samplebank::{SampleBuffer, SampleTable};

#[derive(Parser, Debug)]
#[command(
    name = "samplebank_cli",
    about = "Command-script harness for the sample buffer engine"
)]
struct Cli {
    /// Override path to the engine config JSON
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute a JSON array of buffer commands and print each outcome
    Exec {
        #[arg(long)]
        script: PathBuf,
        /// Override the configured table capacity
        #[arg(long)]
        capacity: Option<usize>,
    },
    /// Load a WAV file into a buffer and write it back out
    Roundtrip {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = 0)]
        start_frame: usize,
        #[arg(long)]
        frames: Option<usize>,
        #[arg(long, default_value = "float")]
        sample_format: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .as_ref()
        .map(BankConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Exec { script, capacity } => run_exec(&config, &script, capacity),
        Commands::Roundtrip {
            input,
            output,
            start_frame,
            frames,
            sample_format,
        } => run_roundtrip(&input, &output, start_frame, frames, &sample_format),
    }
}

fn run_exec(config: &BankConfig, script: &PathBuf, capacity: Option<usize>) -> Result<ExitCode> {
    let contents = fs::read_to_string(script)
        .with_context(|| format!("failed to read script {}", script.display()))?;
    let commands: Vec<BufferCommand> = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse script {}", script.display()))?;

    let capacity = capacity.unwrap_or(config.table.capacity);
    let (mut worker, mut sender, mut outcomes, barrier) = TableWorker::new(
        SampleTable::new(capacity),
        Box::new(WavCodec),
        &config.control,
    );

    let total = commands.len();
    for command in commands {
        let mut pending = command;
        // Drain the worker whenever the intake ring fills up.
        loop {
            match sender.submit(pending) {
                Ok(_) => break,
                Err(rejected) => {
                    worker.process_pending();
                    pending = rejected.0;
                }
            }
        }
        worker.process_pending();
    }

    // Stand in for the render path so staged frees are reclaimed.
    barrier.complete_block();
    worker.reclaim();

    let mut failures = 0;
    for outcome in outcomes.drain() {
        match outcome.result {
            Ok(()) => println!(
                "ok   #{} {} (buffer {})",
                outcome.seq, outcome.label, outcome.index
            ),
            Err(err) => {
                failures += 1;
                println!(
                    "fail #{} {} (buffer {}): [{}] {}",
                    outcome.seq,
                    outcome.label,
                    outcome.index,
                    err.code(),
                    err
                );
            }
        }
    }
    println!("{} commands, {} failed", total, failures);

    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

fn run_roundtrip(
    input: &PathBuf,
    output: &PathBuf,
    start_frame: usize,
    frames: Option<usize>,
    sample_format: &str,
) -> Result<ExitCode> {
    let sample_format: SampleFormat = match sample_format.parse() {
        Ok(format) => format,
        Err(err) => bail!("{}", err),
    };

    let codec = WavCodec;
    let buffer = SampleBuffer::read_file(&codec, input, start_frame, frames)
        .with_context(|| format!("failed to load {}", input.display()))?;
    println!(
        "loaded {}: {} frames, {} channels, {} Hz",
        input.display(),
        buffer.frames(),
        buffer.channels(),
        buffer.sample_rate()
    );

    buffer
        .write_file(
            &codec,
            output,
            HeaderFormat::Wav,
            sample_format,
            0,
            None,
        )
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("wrote {}", output.display());

    Ok(ExitCode::SUCCESS)
}
