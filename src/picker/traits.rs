//! The picker model capability contract.

use crate::model::{Coordinate, LabelRegistry, Micrograph, MicrographId};
use crate::picker::base::PickerCore;
use crate::picker::params::{ChangeResult, Form, ParamId, ParamValue, ParamValues};
use crate::picker::table::{ColumnConfig, Value};
use crate::picker::PickerError;

/// Restartable sequence of coordinates produced for display.
pub type CoordIter<'a> = Box<dyn Iterator<Item = Coordinate> + 'a>;

/// Everything the view layer needs from a picking data model.
///
/// Implementations own a [`PickerCore`] and override the methods whose
/// semantics differ (lazy loading, filtering, composed summaries). The view
/// layer only goes through these entry points.
pub trait PickerModel {
    fn core(&self) -> &PickerCore;

    fn core_mut(&mut self) -> &mut PickerCore;

    fn box_size(&self) -> u32 {
        self.core().box_size()
    }

    fn set_box_size(&mut self, size: u32) {
        self.core_mut().set_box_size(size);
    }

    fn labels(&self) -> &LabelRegistry {
        self.core().labels()
    }

    fn micrograph(&self, id: MicrographId) -> Option<&Micrograph> {
        self.core().micrograph(id)
    }

    /// Micrograph shown at a summary-table row.
    fn micrograph_by_index(&self, row: usize) -> Option<&Micrograph> {
        self.core().micrograph_by_index(row)
    }

    /// Number of rows in the summary table.
    fn rows_count(&self) -> usize {
        self.core().len()
    }

    fn add_micrograph(&mut self, micrograph: Micrograph) -> Result<(), PickerError> {
        self.core_mut().add_micrograph(micrograph);
        Ok(())
    }

    /// Factory for coordinates created by the user or by loaders.
    fn create_coordinate(&self, x: i32, y: i32, label: Option<&str>) -> Coordinate {
        let coord = Coordinate::new(x, y);
        match label {
            Some(label) => coord.with_label(label),
            None => coord,
        }
    }

    fn add_coordinates(
        &mut self,
        id: MicrographId,
        coordinates: Vec<Coordinate>,
    ) -> Result<(), PickerError> {
        self.core_mut().add_coordinates(id, coordinates)
    }

    /// Remove coordinates by their index in [`PickerModel::coordinates`].
    ///
    /// The micrograph is loaded first so a later lazy load cannot bring the
    /// removed picks back.
    fn remove_coordinates(
        &mut self,
        id: MicrographId,
        indices: &[usize],
    ) -> Result<Vec<Coordinate>, PickerError> {
        self.coordinates(id)?;
        self.core_mut().remove_coordinates(id, indices)
    }

    /// Remove all coordinates of a micrograph.
    fn clear_micrograph(&mut self, id: MicrographId) -> Result<(), PickerError> {
        self.core_mut().clear_micrograph(id)
    }

    /// Unfiltered coordinate list of a micrograph, loading it on first use.
    fn coordinates(&mut self, id: MicrographId) -> Result<&[Coordinate], PickerError> {
        Ok(self.core().require(id)?.coordinates())
    }

    /// Coordinates to display for a micrograph under the current parameters.
    ///
    /// Each call re-applies the filters; the underlying list stays cached.
    fn iter_coordinates(&mut self, id: MicrographId) -> Result<CoordIter<'_>, PickerError> {
        Ok(Box::new(self.coordinates(id)?.iter().cloned()))
    }

    /// Parameters the user may adjust.
    fn params(&self) -> Form {
        Form::default()
    }

    /// Apply a parameter change coming from the view layer.
    ///
    /// Unknown names do not fail: they leave the model untouched and return
    /// [`ChangeResult::unchanged`].
    fn change_param(
        &mut self,
        id: MicrographId,
        name: &str,
        value: &ParamValue,
        values: &dyn Fn() -> ParamValues,
    ) -> Result<ChangeResult, PickerError> {
        match ParamId::from_name(name) {
            Some(param) => self.apply_param(id, param, value, values),
            None => {
                log::warn!("Ignoring unknown parameter '{}'", name);
                Ok(ChangeResult::unchanged())
            }
        }
    }

    /// Apply a resolved parameter change. Implementations match every
    /// [`ParamId`] and answer the ones they do not use with `unchanged()`.
    fn apply_param(
        &mut self,
        id: MicrographId,
        param: ParamId,
        value: &ParamValue,
        values: &dyn Fn() -> ParamValues,
    ) -> Result<ChangeResult, PickerError>;

    /// Columns of the summary table.
    fn columns(&self) -> Vec<ColumnConfig>;

    /// Summary table cell. Column 0 is the micrograph name.
    fn value(&mut self, row: usize, col: usize) -> Result<Value, PickerError>;
}
