//! Boundary preparation pipeline.
//!
//! Reads one administrative level from the catalog, removes tiny rings,
//! persists the cleaned catalog and emits one `.poly` boundary file per
//! area for the clipping stage.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use mangrove::catalog;
use mangrove::error::MangroveError;
use mangrove::models::Area;
use mangrove::poly::write_poly_files;
use mangrove::simplify::{remove_tiny_rings, SimplifyConfig};
use mangrove::DataLayout;

#[derive(Parser, Debug)]
#[command(name = "prepare")]
#[command(about = "Clean catalog geometries and write .poly boundary files")]
struct Args {
    /// Shapefile holding the administrative level to process
    #[arg(short, long)]
    source: PathBuf,

    /// Administrative level of the source (0 = countries, 1..=5 = regions)
    #[arg(long, default_value = "0")]
    level: u8,

    /// Data root for cleaned catalogs and poly files
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Only write the cleaned catalog, no .poly files
    #[arg(long)]
    skip_poly: bool,
}

fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    anyhow::ensure!(args.level <= 5, "level must be between 0 and 5");

    let layout = DataLayout::new(&args.data_dir);
    let regionalized = args.level > 0;

    info!("Mangrove Prepare Pipeline");
    info!("Source: {} (level {})", args.source.display(), args.level);

    let areas = if regionalized {
        prepare_regions(&args, &layout)?
    } else {
        prepare_countries(&args, &layout)?
    };

    if !args.skip_poly {
        let poly_dir = layout.poly_dir(regionalized);
        let written = write_poly_files(&areas, regionalized, &poly_dir)?;
        info!("Wrote {} poly files to {}", written.len(), poly_dir.display());
    }

    Ok(())
}

fn prepare_countries(args: &Args, layout: &DataLayout) -> Result<Vec<Area>> {
    let areas = catalog::load_shapefile(&args.source, 0)?;
    let areas = catalog::drop_antarctica(areas);
    let areas = simplify_all(areas, SimplifyConfig::countries())?;

    let path = layout.cleaned_countries();
    catalog::save_catalog(&path, &areas)
        .with_context(|| format!("failed to save country catalog to {}", path.display()))?;
    info!("Saved cleaned country catalog to {}", path.display());

    Ok(areas)
}

fn prepare_regions(args: &Args, layout: &DataLayout) -> Result<Vec<Area>> {
    // Substitute-region synthesis needs the cleaned country geometries.
    let countries_path = layout.cleaned_countries();
    if !countries_path.exists() {
        return Err(MangroveError::MissingCountryFile(countries_path).into());
    }
    let countries = catalog::load_catalog(&countries_path)?;

    let regions = catalog::load_shapefile(&args.source, args.level)?;
    let mut regions = simplify_all(regions, SimplifyConfig::regions())?;

    let synthesized = catalog::synthesize_missing_regions(&countries, &regions, args.level);
    if !synthesized.is_empty() {
        info!(
            "Synthesized {} substitute regions for countries without level-{} rows",
            synthesized.len(),
            args.level
        );
        regions.extend(synthesized);
    }

    let path = layout.cleaned_regions();
    catalog::save_catalog(&path, &regions)
        .with_context(|| format!("failed to save region catalog to {}", path.display()))?;
    info!("Saved cleaned region catalog to {}", path.display());

    Ok(regions)
}

/// Map the pure per-row simplification over the catalog in parallel.
fn simplify_all(areas: Vec<Area>, config: SimplifyConfig) -> Result<Vec<Area>> {
    let pb = ProgressBar::new(areas.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})",
            )?
            .progress_chars("#>-"),
    );

    let cleaned = areas
        .into_par_iter()
        .map(|mut area| {
            area.geometry = remove_tiny_rings(&area.geometry, &area.country_code, &config);
            pb.inc(1);
            area
        })
        .collect();

    pb.finish_with_message("Simplification complete");
    Ok(cleaned)
}
