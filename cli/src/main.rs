//! A*OMP command line front end
//!
//! Reads a TOML config, reconstructs every measurement vector it names and
//! prints the batch summary.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use astar_omp_core::{AstarOmpConfig, BatchInput, BatchReconstructor, SystemClock, VectorWriter};

#[derive(Parser)]
#[command(name = "astar-omp")]
#[command(about = "Sparse signal reconstruction with A*OMP", version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Write the JSON report here, overriding [output].report_file
    #[arg(long)]
    json: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = AstarOmpConfig::from_file(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    info!(config = %args.config.display(), "configuration loaded");

    let input = BatchInput::load(&config).context("reading input data")?;
    let mut writer = VectorWriter::create(&config.output.reconstruction_file)
        .context("opening reconstruction output")?;

    let mut runner = BatchReconstructor::from_config(&config, input.dictionaries, SystemClock::new())
        .context("initializing A*OMP")?;
    let report = runner
        .run(&input.observations, input.targets.as_deref(), &mut writer)
        .context("batch reconstruction failed")?;
    writer.finish().context("flushing reconstruction output")?;

    println!("{report}");
    println!(
        "\nReconstructed vectors written to {}",
        config.output.reconstruction_file.display()
    );

    if let Some(path) = args.json.or(config.output.report_file) {
        report
            .to_json_file(&path)
            .with_context(|| format!("writing report {}", path.display()))?;
        info!(path = %path.display(), "report written");
    }

    Ok(())
}
