//! Multipolygon cleanup: drop tiny constituent rings before poly emission.
//!
//! Large countries carry hundreds of uninhabited islets that blow up the
//! boundary files without changing which map data gets extracted in
//! practice. The drop threshold scales with the total area of the
//! multipolygon, with a fixed override list for a handful of countries
//! whose archipelagos need a gentler hand.

use geo::{Area as GeoArea, MultiPolygon, Polygon};

use crate::models::AreaGeometry;

/// Threshold settings for one run. `area_floor` protects already-tiny
/// areas from losing rings at all; `area_ceiling` is the size-class
/// boundary above which the aggressive per-ring threshold applies.
#[derive(Debug, Clone, Copy)]
pub struct SimplifyConfig {
    pub area_floor: f64,
    pub area_ceiling: f64,
    pub regionalized: bool,
}

impl SimplifyConfig {
    /// Defaults for country-level (level 0) processing.
    pub fn countries() -> Self {
        Self {
            area_floor: 0.1,
            area_ceiling: 250.0,
            regionalized: false,
        }
    }

    /// Lower thresholds for regional (level >= 1) processing, where the
    /// individual rows are much smaller.
    pub fn regions() -> Self {
        Self {
            area_floor: 0.01,
            area_ceiling: 50.0,
            regionalized: true,
        }
    }

    pub fn for_mode(regionalized: bool) -> Self {
        if regionalized {
            Self::regions()
        } else {
            Self::countries()
        }
    }
}

/// Per-country ring-threshold overrides, checked before the size-class
/// rule. CHL and IDN are long/fragmented enough that the general rule
/// strips inhabited islands; RUS, GRL, CAN and USA get the same value in
/// both modes (kept as observed in the source data pipeline).
const THRESHOLD_OVERRIDES: &[(&str, f64)] = &[
    ("CHL", 0.01),
    ("IDN", 0.01),
    ("RUS", 0.01),
    ("GRL", 0.01),
    ("CAN", 0.01),
    ("USA", 0.01),
];

/// Remove tiny constituent rings from a multipolygon.
///
/// Single polygons pass through untouched, as do multipolygons whose
/// total area is already below `config.area_floor` (small island nations
/// must not be erased entirely). Otherwise only rings whose individual
/// planar area exceeds the selected threshold survive; an empty result
/// is legal. Pure: the output depends only on the arguments.
pub fn remove_tiny_rings(
    geometry: &AreaGeometry,
    country_code: &str,
    config: &SimplifyConfig,
) -> AreaGeometry {
    let mp = match geometry {
        AreaGeometry::Polygon(_) => return geometry.clone(),
        AreaGeometry::MultiPolygon(mp) => mp,
    };

    let total_area = mp.unsigned_area();
    if total_area < config.area_floor {
        return geometry.clone();
    }

    let threshold = ring_threshold(total_area, country_code, config);

    let kept: Vec<Polygon<f64>> = mp
        .0
        .iter()
        .filter(|p| p.unsigned_area() > threshold)
        .cloned()
        .collect();

    AreaGeometry::MultiPolygon(MultiPolygon::new(kept))
}

fn ring_threshold(total_area: f64, country_code: &str, config: &SimplifyConfig) -> f64 {
    if let Some(&(_, threshold)) = THRESHOLD_OVERRIDES
        .iter()
        .find(|(code, _)| *code == country_code)
    {
        return threshold;
    }

    if total_area > config.area_ceiling {
        0.1
    } else {
        0.001
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{Coord, LineString};

    /// Square polygon of the given area, offset so rings don't overlap.
    fn square_with_area(area: f64, offset: f64) -> Polygon<f64> {
        let side = area.sqrt();
        let ring = vec![
            Coord { x: offset, y: 0.0 },
            Coord {
                x: offset + side,
                y: 0.0,
            },
            Coord {
                x: offset + side,
                y: side,
            },
            Coord { x: offset, y: side },
            Coord { x: offset, y: 0.0 },
        ];
        Polygon::new(LineString::new(ring), vec![])
    }

    fn multipolygon(areas: &[f64]) -> AreaGeometry {
        let mut offset = 0.0;
        let polys = areas
            .iter()
            .map(|&a| {
                let p = square_with_area(a, offset);
                offset += a.sqrt() + 1.0;
                p
            })
            .collect();
        AreaGeometry::MultiPolygon(MultiPolygon::new(polys))
    }

    fn surviving_areas(geom: &AreaGeometry) -> Vec<f64> {
        geom.polygons().map(|p| p.unsigned_area()).collect()
    }

    #[test]
    fn test_single_polygon_is_identity() {
        let geom = AreaGeometry::Polygon(square_with_area(0.0001, 0.0));
        let out = remove_tiny_rings(&geom, "NLD", &SimplifyConfig::countries());
        assert!(matches!(out, AreaGeometry::Polygon(_)));
        assert_eq!(out.unsigned_area(), geom.unsigned_area());
    }

    #[test]
    fn test_tiny_total_area_is_identity() {
        // Total 0.05 < area_floor 0.1: nothing may be stripped.
        let geom = multipolygon(&[0.03, 0.02]);
        let out = remove_tiny_rings(&geom, "NLD", &SimplifyConfig::countries());
        assert_eq!(out.polygons().count(), 2);
    }

    #[test]
    fn test_large_country_uses_aggressive_threshold() {
        // Total area > 250 selects threshold 0.1: the 0.05 ring goes,
        // 0.2 and 50 stay.
        let geom = multipolygon(&[280.0, 0.05, 0.2, 50.0]);
        let out = remove_tiny_rings(&geom, "NLD", &SimplifyConfig::countries());
        let areas = surviving_areas(&out);
        assert_eq!(areas.len(), 3);
        assert!(areas.iter().all(|&a| a > 0.1));
        assert!(!areas.iter().any(|&a| (a - 0.05).abs() < 1e-9));
    }

    #[test]
    fn test_mid_size_country_uses_fine_threshold() {
        // Total between floor and ceiling selects threshold 0.001.
        let geom = multipolygon(&[40.0, 0.01, 0.0005]);
        let out = remove_tiny_rings(&geom, "NLD", &SimplifyConfig::countries());
        let areas = surviving_areas(&out);
        assert_eq!(areas.len(), 2);
        assert!(areas.iter().all(|&a| a > 0.001));
    }

    #[test]
    fn test_override_countries_keep_small_islands() {
        for code in ["CHL", "IDN", "RUS", "GRL", "CAN", "USA"] {
            for regionalized in [false, true] {
                // Total far above both ceilings; without the override the
                // 0.02 ring would be dropped at threshold 0.1.
                let geom = multipolygon(&[300.0, 0.02, 0.005]);
                let config = SimplifyConfig::for_mode(regionalized);
                let out = remove_tiny_rings(&geom, code, &config);
                let areas = surviving_areas(&out);
                assert_eq!(areas.len(), 2, "country {code} regionalized {regionalized}");
                assert!(areas.iter().all(|&a| a > 0.01));
            }
        }
    }

    #[test]
    fn test_regionalized_thresholds() {
        // Total 60 > regional ceiling 50 selects threshold 0.1.
        let geom = multipolygon(&[60.0, 0.05]);
        let out = remove_tiny_rings(&geom, "NLD", &SimplifyConfig::regions());
        assert_eq!(out.polygons().count(), 1);

        // Total 10 < ceiling selects threshold 0.001.
        let geom = multipolygon(&[10.0, 0.05]);
        let out = remove_tiny_rings(&geom, "NLD", &SimplifyConfig::regions());
        assert_eq!(out.polygons().count(), 2);
    }

    #[test]
    fn test_empty_result_is_legal() {
        // Total 270 > 250 selects threshold 0.1 and every ring is below
        // it: an empty multipolygon, not an error.
        let geom = multipolygon(&[0.09; 3000]);
        let out = remove_tiny_rings(&geom, "NLD", &SimplifyConfig::countries());
        assert!(out.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let geom = multipolygon(&[280.0, 0.05, 0.2, 50.0]);
        let config = SimplifyConfig::countries();
        let a = remove_tiny_rings(&geom, "NLD", &config);
        let b = remove_tiny_rings(&geom, "NLD", &config);
        assert_eq!(surviving_areas(&a), surviving_areas(&b));
    }
}
