//! Per-area extraction pipeline.
//!
//! Fans an external clipping backend out over every boundary artifact,
//! carving one extract per area from the planet file. Existing extracts
//! are never recomputed.

mod config;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use mangrove::clip::{clip_batch, ClipBackend, ClipOutcome, ClipRequest, Clipper};
use mangrove::DataLayout;

use crate::config::Config;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Osmconvert,
    Osmosis,
}

impl From<BackendArg> for ClipBackend {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Osmconvert => ClipBackend::OsmConvert,
            BackendArg::Osmosis => ClipBackend::Osmosis,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "extract")]
#[command(about = "Clip per-area extracts out of the planet file")]
struct Args {
    /// Data root holding planet_osm/ and the poly directories
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Clip regional rather than country boundaries
    #[arg(long)]
    regionalized: bool,

    /// Only this country (and, when regionalized, its regions)
    #[arg(long)]
    country: Option<String>,

    /// Clipping backend
    #[arg(long, value_enum)]
    backend: Option<BackendArg>,

    /// Backend executable, if not on PATH
    #[arg(long)]
    executable: Option<PathBuf>,

    /// Per-invocation timeout in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Optional TOML config supplying defaults for the flags above
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Some(Config::load_from_file(path)?),
        None => None,
    };
    let clip_config = config.as_ref().and_then(|c| c.clip.clone());

    let data_dir = args
        .data_dir
        .clone()
        .or_else(|| config.as_ref().and_then(|c| c.data_dir.clone()))
        .unwrap_or_else(|| PathBuf::from("data"));
    let layout = DataLayout::new(data_dir);

    let backend = match args.backend {
        Some(b) => b.into(),
        None => match clip_config.as_ref().and_then(|c| c.backend.as_deref()) {
            Some("osmosis") => ClipBackend::Osmosis,
            Some("osmconvert") | None => ClipBackend::OsmConvert,
            Some(other) => anyhow::bail!("unknown backend {:?} in config", other),
        },
    };
    let timeout_secs = args
        .timeout_secs
        .or_else(|| clip_config.as_ref().and_then(|c| c.timeout_secs))
        .unwrap_or(3600);
    let executable = args
        .executable
        .clone()
        .or_else(|| clip_config.as_ref().and_then(|c| c.executable.clone()));

    let mut clipper = Clipper::new(backend, Duration::from_secs(timeout_secs));
    if let Some(executable) = executable {
        clipper = clipper.with_executable(executable);
    }

    let planet = layout.planet_file();
    anyhow::ensure!(
        planet.exists(),
        "planet file not found at {}",
        planet.display()
    );

    let requests = collect_requests(&layout, &args)?;
    anyhow::ensure!(
        !requests.is_empty(),
        "no poly files found in {}; run prepare first",
        layout.poly_dir(args.regionalized).display()
    );

    std::fs::create_dir_all(layout.extracts_dir(args.regionalized))?;

    let entries = clip_batch(&clipper, &requests)?;

    let mut extracted = 0;
    let mut already_done = 0;
    let mut failed = Vec::new();
    for entry in &entries {
        match &entry.result {
            Ok(ClipOutcome::Extracted) => extracted += 1,
            Ok(ClipOutcome::AlreadyDone) => already_done += 1,
            Err(_) => failed.push(entry.code.clone()),
        }
    }

    info!(
        "Extraction complete: {} extracted, {} already done, {} failed",
        extracted,
        already_done,
        failed.len()
    );
    if !failed.is_empty() {
        warn!("Failed areas (retry individually): {}", failed.join(", "));
    }

    Ok(())
}

/// One request per poly artifact, optionally narrowed to a single
/// country's artifacts. Order is irrelevant: outputs are named by code.
fn collect_requests(layout: &DataLayout, args: &Args) -> Result<Vec<ClipRequest>> {
    let poly_dir = layout.poly_dir(args.regionalized);
    let planet = layout.planet_file();

    let mut requests = Vec::new();
    let entries = std::fs::read_dir(&poly_dir)
        .with_context(|| format!("failed to read poly dir {}", poly_dir.display()))?;
    for entry in entries {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("poly") {
            continue;
        }
        let Some(code) = path.file_stem().and_then(|s| s.to_str()).map(String::from) else {
            continue;
        };

        if let Some(country) = &args.country {
            let matches = code == *country || code.starts_with(&format!("{}.", country));
            if !matches {
                continue;
            }
        }

        requests.push(ClipRequest {
            dest: layout.extract_file(args.regionalized, &code),
            code,
            planet: planet.clone(),
            poly: path,
        });
    }

    Ok(requests)
}
