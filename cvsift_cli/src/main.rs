//! cvsift - filter a Common Voice corpus for multi-speaker TTS training.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::Parser;
use cvsift_core::mos::CommandModel;
use cvsift_core::{MosModel, Pipeline};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod paths;
mod settings;

use paths::{prepare_output, CorpusPaths};

/// Filter a Common Voice dataset similarly to "Can we use Common Voice to
/// train a multi-speaker TTS system?".
///
/// Clips longer than 16.7 s are dropped, audio is resampled to 16 kHz and
/// silence-trimmed, speakers need more than 20 minutes of audio and are
/// capped at 10 hours, and only speakers whose mean MOS reaches the
/// threshold are kept.
#[derive(Parser, Debug)]
#[command(name = "cvsift")]
#[command(version)]
pub struct Cli {
    /// Directory containing the Common Voice files, i.e. train.tsv,
    /// clip_durations.tsv and clips/
    pub cv_dir: PathBuf,

    /// Output directory for the filtered dataset
    pub output_dir: PathBuf,

    /// Minimum MOS for a speaker to be included, usually between 1.0 and 4.0
    /// [default: 3.0]
    #[arg(long)]
    pub mos_threshold: Option<f32>,

    /// TOML file overriding the default thresholds
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// External MOS predictor; the WAV path is appended as the last argument
    /// and the score is read from the last line of its output
    #[arg(long, env = "CVSIFT_SCORER_CMD")]
    pub scorer_cmd: Option<String>,

    /// ONNX MOS model to run in-process
    #[cfg(feature = "onnx")]
    #[arg(long, conflicts_with = "scorer_cmd")]
    pub mos_model: Option<PathBuf>,

    /// Give up scoring a file after this many seconds
    #[arg(long)]
    pub scorer_timeout: Option<u64>,

    /// Drop clips whose audio cannot be decoded instead of aborting
    #[arg(long)]
    pub skip_unreadable_audio: bool,

    /// Also write a JSONL manifest of the kept clips
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long, env = "LOGLEVEL", default_value = "info")]
    pub log_level: String,
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| level.to_lowercase().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Construct the quality model handle named on the command line.
///
/// The external command enforces `timeout` itself; the in-process model is
/// run on a worker thread that is rebuilt after each timeout.
fn build_model(cli: &Cli, timeout: Option<Duration>) -> Result<Box<dyn MosModel + Send>> {
    #[cfg(feature = "onnx")]
    {
        use cvsift_core::mos::{OnnxModel, TimeoutModel};

        if let Some(path) = &cli.mos_model {
            paths::verify_file(path)?;
            info!("Loading MOS model {}", path.display());
            let model: Box<dyn MosModel + Send> = match timeout {
                Some(timeout) => {
                    let path = path.clone();
                    Box::new(TimeoutModel::spawn(move || OnnxModel::load(&path), timeout)?)
                }
                None => Box::new(OnnxModel::load(path)?),
            };
            return Ok(model);
        }
    }
    match &cli.scorer_cmd {
        Some(cmd) => Ok(Box::new(
            CommandModel::from_command_line(cmd)?.with_timeout(timeout),
        )),
        None => bail!("no quality model configured, pass --scorer-cmd"),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    // Assert user input is valid before doing any work
    let corpus = CorpusPaths::verify(&cli.cv_dir)?;
    let config = settings::resolve(&cli)?;
    let mut model = build_model(&cli, config.scorer_timeout())?;
    let output_clips = prepare_output(&cli.output_dir)?;
    info!("Directories verified");

    let metadata = cvsift_tools::read_metadata(&corpus.train)?;
    let durations = cvsift_tools::read_durations(&corpus.durations)?;
    info!("Files read");

    let started = Instant::now();
    let output = Pipeline::new(config)
        .with_output_clip_dir(output_clips)
        .run(&mut model, &metadata, &durations, &corpus.clips)?;
    drop(model);

    let clips: Vec<_> = output.clips().collect();
    let tables = cvsift_tools::write_tables(&cli.output_dir, &clips)?;
    info!(
        "Stored clip info in {} and {}",
        tables.train.display(),
        tables.durations.display()
    );

    if let Some(manifest) = &cli.manifest {
        cvsift_tools::write_manifest(manifest, clips.iter().copied())?;
    }

    info!("{}", output.report);
    info!("Done in {:.1}s", started.elapsed().as_secs_f32());
    Ok(())
}
