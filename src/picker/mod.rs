//! Particle-picking data models.
//!
//! Every model implements [`PickerModel`], the contract the view layer talks
//! to. Models own their micrographs through a [`PickerCore`] and load
//! per-micrograph coordinates lazily, at most once, the first time they are
//! needed.
//!
//! ## Models
//!
//! - [`SimplePickerModel`]: micrographs added directly or paired with text coordinate files
//! - [`RandomPickerModel`]: synthetic picks for demos and tests
//! - [`RelionPickerModel`]: one RELION picking run, read from its STAR files
//! - [`PickerCmpModel`]: two runs side by side with derived comparison columns

mod base;
mod compare;
mod error;
mod export;
mod params;
mod random;
mod relion;
mod simple;
mod table;
mod traits;

#[cfg(test)]
mod tests;

pub use base::{PickerCore, DEFAULT_BOX_SIZE};
pub use compare::{count_matches, MicrographMatching, PickerCmpModel, RunLabels, Sources};
pub use error::PickerError;
pub use export::{export_picks, ExportFormat, ExportResult, FormatWarning, WarningSeverity};
pub use params::{
    resolve_bool, resolve_f64, resolve_value, ChangeResult, Form, Param, ParamDisplay, ParamId,
    ParamKind, ParamValue, ParamValues,
};
pub use random::{PickShape, RandomPickerModel};
pub use relion::{PickKind, RelionLayout, RelionPickerModel};
pub use simple::SimplePickerModel;
pub use table::{ColumnConfig, DataType, Value};
pub use traits::{CoordIter, PickerModel};
