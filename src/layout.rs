//! Directory layout under the data root.
//!
//! Every path used by the pipeline is derived here, so the prepare and
//! extract binaries agree on where artifacts live without passing paths
//! around.

use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The planet-scale source file.
    pub fn planet_file(&self) -> PathBuf {
        self.root.join("planet_osm").join("planet-latest.osm.pbf")
    }

    /// Poly artifacts, keyed by regionalization mode.
    pub fn poly_dir(&self, regionalized: bool) -> PathBuf {
        if regionalized {
            self.root.join("regional_poly_files")
        } else {
            self.root.join("country_poly_files")
        }
    }

    /// Extracted per-area `.osm.pbf` files, keyed by granularity.
    pub fn extracts_dir(&self, regionalized: bool) -> PathBuf {
        if regionalized {
            self.root.join("regional_extracts")
        } else {
            self.root.join("country_extracts")
        }
    }

    pub fn extract_file(&self, regionalized: bool, code: &str) -> PathBuf {
        self.extracts_dir(regionalized).join(format!("{}.osm.pbf", code))
    }

    /// Cleaned country catalog; prerequisite for all regional runs.
    pub fn cleaned_countries(&self) -> PathBuf {
        self.root.join("cleaned_shapes").join("global_countries.json")
    }

    pub fn cleaned_regions(&self) -> PathBuf {
        self.root.join("cleaned_shapes").join("global_regions.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poly_dir_keyed_by_mode() {
        let layout = DataLayout::new("/data");
        assert_eq!(
            layout.poly_dir(false),
            Path::new("/data/country_poly_files")
        );
        assert_eq!(
            layout.poly_dir(true),
            Path::new("/data/regional_poly_files")
        );
    }

    #[test]
    fn test_extract_file_named_by_code() {
        let layout = DataLayout::new("/data");
        assert_eq!(
            layout.extract_file(true, "FRA.1_1"),
            Path::new("/data/regional_extracts/FRA.1_1.osm.pbf")
        );
    }
}
