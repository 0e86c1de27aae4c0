//! emvis - particle-picking data models for electron-microscopy viewers.
//!
//! The crate holds what a picking viewer shows next to each micrograph: the
//! picked coordinates, their labels, and a summary table with one row per
//! micrograph. Picking runs are exposed through the [`picker::PickerModel`]
//! trait, implemented by
//!
//! - [`picker::SimplePickerModel`] for plain-text coordinate files,
//! - [`picker::RandomPickerModel`] for synthetic demo picks,
//! - [`picker::RelionPickerModel`] for RELION auto- and manual-pick runs,
//! - [`picker::PickerCmpModel`] for comparing two runs side by side.

pub mod color_utils;
pub mod config;
pub mod format;
pub mod logging;
pub mod model;
pub mod picker;

pub use config::{AppConfig, LogLevel};
pub use model::{Coordinate, Label, Micrograph, MicrographId};
pub use picker::{PickerError, PickerModel};
