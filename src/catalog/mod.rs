//! Administrative catalog loading and persistence.
//!
//! The raw catalog is a set of per-level GADM shapefiles (`GID_0`..`GID_5`
//! codes, `NAME_x`, `TYPE_x` attributes). Cleaned catalogs are persisted
//! as JSON so the regional pipeline can reuse the country geometries
//! without re-reading the source data.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use shapefile::dbase::{FieldValue, Record};
use shapefile::{PolygonRing, Shape};
use tracing::{info, warn};

use crate::error::MangroveError;
use crate::models::{synthesize_region_code, Area, AreaGeometry};

/// Read one administrative level from a shapefile.
///
/// Rows whose shape is not a polygon are malformed: they are reported
/// with their country code and skipped, never aborting the rest of the
/// load.
pub fn load_shapefile(path: &Path, level: u8) -> Result<Vec<Area>> {
    let mut reader = shapefile::Reader::from_path(path)
        .with_context(|| format!("failed to open shapefile {}", path.display()))?;

    let mut areas = Vec::new();
    for row in reader.iter_shapes_and_records() {
        let (shape, record) = row.context("error reading shape and record")?;
        match row_to_area(shape, &record, level) {
            Ok(area) => areas.push(area),
            Err(e) => warn!("{}", e),
        }
    }

    info!("Loaded {} areas from {}", areas.len(), path.display());
    Ok(areas)
}

fn row_to_area(shape: Shape, record: &Record, level: u8) -> Result<Area, MangroveError> {
    let country_code = character_field(record, "GID_0").unwrap_or_else(|| "-".to_string());

    let geometry = match shape {
        Shape::Polygon(p) => polygon_to_geometry(&p),
        other => {
            return Err(MangroveError::MalformedGeometry {
                code: country_code,
                shape: format!("{:?}", other.shapetype()),
            })
        }
    };

    let (region_code, region_type) = if level > 0 {
        (
            character_field(record, &format!("GID_{}", level)),
            character_field(record, &format!("TYPE_{}", level)),
        )
    } else {
        (None, None)
    };

    let name = character_field(record, &format!("NAME_{}", level))
        .or_else(|| character_field(record, "NAME_0"))
        .unwrap_or_default();

    Ok(Area {
        country_code,
        region_code,
        name,
        region_type,
        geometry,
    })
}

fn character_field(record: &Record, field: &str) -> Option<String> {
    match record.get(field) {
        Some(FieldValue::Character(Some(s))) => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Convert a shapefile polygon to area geometry, keeping outer rings
/// only (holes are not modeled in boundary artifacts). A single outer
/// ring becomes a plain polygon so the simplifier can treat it as such.
fn polygon_to_geometry(p: &shapefile::Polygon) -> AreaGeometry {
    let mut polys: Vec<Polygon<f64>> = Vec::new();
    for ring in p.rings() {
        let points = match ring {
            PolygonRing::Outer(points) => points,
            PolygonRing::Inner(_) => continue,
        };
        let mut coords: Vec<Coord<f64>> =
            points.iter().map(|pt| Coord { x: pt.x, y: pt.y }).collect();
        // Shapefiles store rings closed already; make sure anyway.
        if coords.first() != coords.last() {
            if let Some(&first) = coords.first() {
                coords.push(first);
            }
        }
        polys.push(Polygon::new(LineString::new(coords), vec![]));
    }

    if polys.len() == 1 {
        AreaGeometry::Polygon(polys.pop().unwrap())
    } else {
        AreaGeometry::MultiPolygon(MultiPolygon::new(polys))
    }
}

/// Persist a cleaned catalog as JSON.
pub fn save_catalog(path: &Path, areas: &[Area]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)
        .with_context(|| format!("failed to create catalog file {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), areas)
        .with_context(|| format!("failed to serialize catalog to {}", path.display()))?;
    Ok(())
}

/// Load a previously cleaned catalog.
pub fn load_catalog(path: &Path) -> Result<Vec<Area>> {
    let file = File::open(path)
        .with_context(|| format!("failed to open catalog file {}", path.display()))?;
    let areas = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse catalog file {}", path.display()))?;
    Ok(areas)
}

/// Remove Antarctica from a country catalog. No roads there anyway, and
/// its geometry wraps the pole, which the boundary format cannot express.
pub fn drop_antarctica(areas: Vec<Area>) -> Vec<Area> {
    areas.into_iter().filter(|a| a.name != "Antarctica").collect()
}

/// One substitute area per country that has no rows at the requested
/// level, reusing the country geometry under a synthesized region code.
/// Guarantees every country yields at least one artifact at every level.
pub fn synthesize_missing_regions(
    countries: &[Area],
    regions: &[Area],
    level: u8,
) -> Vec<Area> {
    let present: HashSet<&str> = regions.iter().map(|a| a.country_code.as_str()).collect();

    countries
        .iter()
        .filter(|c| !present.contains(c.country_code.as_str()))
        .map(|c| Area {
            country_code: c.country_code.clone(),
            region_code: Some(synthesize_region_code(&c.country_code, level)),
            name: c.name.clone(),
            region_type: None,
            geometry: c.geometry.clone(),
        })
        .collect()
}
