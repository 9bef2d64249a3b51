//! Boundary artifact (`.poly`) writing.

pub mod format;
pub mod writer;

pub use format::{parse_poly, write_poly, PolyFile};
pub use writer::{write_area, write_poly_files};
