//! Data models for particle picking.

mod coordinate;
mod label;
mod micrograph;

pub use coordinate::{Coordinate, ORIGIN_RUN_KEY};
pub use label::{Label, LabelRegistry};
pub use micrograph::{LoadState, Micrograph, MicrographId};
