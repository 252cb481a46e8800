//! `geofuse` command-line front-end
//!
//! Matches every record of a timestamp log to the nearest fix of a `.pos`
//! track and writes the result as GeoJSON.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use geofuse_core::config::FusionConfig;
use geofuse_core::error::GeoFuseError;
use geofuse_core::{geojson, pipeline};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Timestamp log (JSON)
    log: PathBuf,

    /// Position track (.pos)
    pos: PathBuf,

    /// Output file; standard output when omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Settings file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write compact JSON instead of indented
    #[arg(long)]
    compact: bool,

    /// Warn about matches further apart than this many milliseconds
    #[arg(long)]
    max_gap_ms: Option<f64>,

    /// GPST minus UTC in seconds, applied to GPST tracks
    #[arg(long)]
    gps_utc_offset: Option<f64>,

    /// Reject out-of-order position samples instead of sorting them
    #[arg(long)]
    require_sorted: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Settings file merged with command-line overrides
    fn resolve_config(&self) -> anyhow::Result<FusionConfig> {
        let mut config = match &self.config {
            Some(path) => FusionConfig::from_file(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => FusionConfig::default(),
        };

        if self.compact {
            config.output.pretty = false;
        }
        if let Some(gap) = self.max_gap_ms {
            config.max_time_gap_ms = Some(gap);
        }
        if let Some(offset) = self.gps_utc_offset {
            config.position.gps_utc_offset_s = offset;
        }
        if self.require_sorted {
            config.position.require_sorted = true;
        }

        config.validate()?;
        Ok(config)
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(args: &Args) -> anyhow::Result<()> {
    let config = args.resolve_config()?;
    let output = pipeline::fuse_files(&args.log, &args.pos, &config)?;

    match &args.output {
        Some(path) => {
            pipeline::write_output(path, &output.collection, &config.output)?;
            tracing::info!("Wrote {}", path.display());
        }
        None => {
            let text = geojson::to_string(&output.collection, &config.output)?;
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", text).context("writing to standard output")?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<GeoFuseError>() {
                Some(fuse_err) => eprintln!("error: {}: {:#}", fuse_err.kind(), err),
                None => eprintln!("error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}
