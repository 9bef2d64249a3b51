//! Per-area boundary artifact emission.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use geo::{Centroid, Distance, Geodesic, Point, Polygon};
use tracing::{debug, warn};

use crate::models::Area;
use crate::poly::format;

/// Region-type category excluded from regional runs.
const WATER_BODY: &str = "Water body";

/// Country-level ring exclusions: `(country, (lat, lon), cutoff_km)`.
///
/// A ring whose centroid lies within `cutoff_km` (geodesic, WGS-84) of
/// the reference point is not written. Both entries remove one known
/// spurious ring in the source data: a high-Arctic artifact for Canada
/// and a Siberian one for Russia. Only consulted for country-level
/// artifacts.
const RING_EXCLUSIONS: &[(&str, (f64, f64), f64)] = &[
    ("CAN", (83.24, -79.80), 2000.0),
    ("RUS", (58.89, 82.26), 500.0),
];

fn is_excluded(country_code: &str, polygon: &Polygon<f64>) -> bool {
    let Some(&(_, (lat, lon), cutoff_km)) = RING_EXCLUSIONS
        .iter()
        .find(|(code, _, _)| *code == country_code)
    else {
        return false;
    };
    let Some(centroid) = polygon.centroid() else {
        return false;
    };
    let km = Geodesic.distance(centroid, Point::new(lon, lat)) / 1000.0;
    km < cutoff_km
}

/// Write one `.poly` artifact for an area; returns the path written.
///
/// The file is named solely by the area's artifact code, so re-runs
/// overwrite in place and output is independent of iteration order.
pub fn write_area(area: &Area, regionalized: bool, poly_dir: &Path) -> Result<PathBuf> {
    let code = area.artifact_code(regionalized)?;
    let path = poly_dir.join(format!("{}.poly", code));

    let rings: Vec<_> = area
        .geometry
        .polygons()
        .filter(|polygon| {
            if !regionalized && is_excluded(&area.country_code, polygon) {
                debug!("{}: dropping excluded ring near reference point", code);
                return false;
            }
            true
        })
        .map(|polygon| polygon.exterior())
        .collect();

    let file = File::create(&path)
        .with_context(|| format!("failed to create poly file {}", path.display()))?;
    let mut out = BufWriter::new(file);
    format::write_poly(&mut out, code, rings)?;
    out.flush()
        .with_context(|| format!("failed to flush poly file {}", path.display()))?;

    Ok(path)
}

/// Emit one boundary artifact per surviving area.
///
/// Areas with the `-` country sentinel are dropped, as are `Water body`
/// regions on regionalized runs. A failure on one area is logged with
/// its code and does not abort the rest of the batch.
pub fn write_poly_files(
    areas: &[Area],
    regionalized: bool,
    poly_dir: &Path,
) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(poly_dir)
        .with_context(|| format!("failed to create poly dir {}", poly_dir.display()))?;

    let mut written = Vec::new();
    for area in areas {
        if area.country_code == "-" {
            continue;
        }
        if regionalized && area.region_type.as_deref() == Some(WATER_BODY) {
            continue;
        }

        match write_area(area, regionalized, poly_dir) {
            Ok(path) => written.push(path),
            Err(e) => warn!("skipping area {}: {:#}", area.country_code, e),
        }
    }

    Ok(written)
}
