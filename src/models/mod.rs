//! Shared data model types.

pub mod area;

pub use area::{synthesize_region_code, Area, AreaGeometry};
