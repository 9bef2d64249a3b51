//! Error taxonomy for catalog and boundary processing.
//!
//! Per-area errors (`MalformedGeometry`, `MissingRegionCode`) are local:
//! the batch logs them with the area's code and keeps going. Only
//! `MissingCountryFile` aborts a run, since regional processing cannot
//! synthesize substitute areas without the cleaned country catalog.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MangroveError {
    #[error("area {code}: unsupported shape type {shape}, expected Polygon")]
    MalformedGeometry { code: String, shape: String },

    #[error("area {code}: no region code at the requested level")]
    MissingRegionCode { code: String },

    #[error("cleaned country catalog not found at {0}; run the country-level prepare first")]
    MissingCountryFile(PathBuf),
}
