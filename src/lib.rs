//! Mangrove - boundary preparation and per-area OSM extraction
//!
//! This library provides shared types and modules for the prepare and
//! extract binaries.

pub mod catalog;
pub mod clip;
pub mod error;
pub mod layout;
pub mod models;
pub mod poly;
pub mod simplify;

pub use error::MangroveError;
pub use layout::DataLayout;
pub use models::{Area, AreaGeometry};
pub use simplify::SimplifyConfig;
