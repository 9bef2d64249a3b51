//! Administrative area rows and their geometry.

use geo::{Area as GeoArea, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use crate::error::MangroveError;

/// One row of the administrative catalog.
///
/// `country_code` is the GID_0 / ISO3 code and is always present (the
/// catalog uses `"-"` as a "no country assigned" sentinel, filtered out
/// before poly emission). `region_code` is the GID_N code at the requested
/// level and is only set for rows read at level > 0 (or synthesized for
/// countries with no subdivisions).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Area {
    pub country_code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_code: Option<String>,

    pub name: String,

    /// Region type (e.g. "Water body"), only present at level >= 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_type: Option<String>,

    pub geometry: AreaGeometry,
}

impl Area {
    /// The code that identifies this area's output artifacts: the country
    /// code for country-level runs, the region code otherwise.
    pub fn artifact_code(&self, regionalized: bool) -> Result<&str, MangroveError> {
        if !regionalized {
            return Ok(&self.country_code);
        }
        self.region_code
            .as_deref()
            .ok_or_else(|| MangroveError::MissingRegionCode {
                code: self.country_code.clone(),
            })
    }
}

/// Planar lon/lat geometry of one area: a single exterior ring or an
/// ordered collection of them. Holes are not modeled; the catalog reader
/// keeps outer rings only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AreaGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

impl AreaGeometry {
    /// Iterate the constituent polygons in catalog order.
    pub fn polygons(&self) -> std::slice::Iter<'_, Polygon<f64>> {
        match self {
            AreaGeometry::Polygon(p) => std::slice::from_ref(p).iter(),
            AreaGeometry::MultiPolygon(mp) => mp.0.iter(),
        }
    }

    /// Total planar (unprojected) area.
    pub fn unsigned_area(&self) -> f64 {
        match self {
            AreaGeometry::Polygon(p) => p.unsigned_area(),
            AreaGeometry::MultiPolygon(mp) => mp.unsigned_area(),
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            AreaGeometry::Polygon(_) => false,
            AreaGeometry::MultiPolygon(mp) => mp.0.is_empty(),
        }
    }
}

/// Substitute region code for a country with no rows at the requested
/// level: the country code plus `level` `.0` segments and a `_1` suffix,
/// matching the GADM convention (level 1 -> `USA.0_1`, level 2 ->
/// `USA.0.0_1`).
pub fn synthesize_region_code(country_code: &str, level: u8) -> String {
    let mut code = String::from(country_code);
    for _ in 0..level {
        code.push_str(".0");
    }
    code.push_str("_1");
    code
}
