//! Scenario tests for the picker models.
//!
//! These tests build small run directories on disk and drive the models
//! only through the `PickerModel` entry points, the way the view layer does.

mod contract_tests;
mod export_tests;
mod fixtures;
