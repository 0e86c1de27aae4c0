//! Picking file formats.
//!
//! This module reads and writes the files a picking run leaves on disk.
//!
//! ## Supported Formats
//!
//! - **STAR**: RELION tables (summary, micrograph lists, per-micrograph picks)
//! - **Text coordinates**: one pick per line, point or segment, optional label
//!
//! ## Usage
//!
//! ```rust,ignore
//! use emvis::format::{read_coordinates, StarFile, Strictness};
//!
//! let summary = StarFile::read(Path::new("AutoPick/job010/summary.star"))?;
//! let picks = read_coordinates(Path::new("001.txt"), Strictness::Strict)?;
//! ```

mod coords;
mod error;
mod sources;
mod star;

pub use coords::{
    format_coordinates, parse_coordinates, read_coordinates, write_coordinates, CoordinateFile,
    Strictness,
};
pub use error::FormatError;
pub use sources::{
    discover_sources, expand_pattern, pair_sources, wildcard_match, MicrographSource,
};
pub use star::{StarFile, StarRow, StarTable};
