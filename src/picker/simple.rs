//! Picker model over micrographs paired with text coordinate files.

use std::collections::HashMap;
use std::path::PathBuf;

use web_time::Instant;

use crate::format::{read_coordinates, MicrographSource, Strictness};
use crate::model::{Coordinate, LoadState, Micrograph, MicrographId};
use crate::picker::base::PickerCore;
use crate::picker::params::{ChangeResult, Form, Param, ParamId, ParamValue, ParamValues};
use crate::picker::table::{ColumnConfig, DataType, Value};
use crate::picker::traits::PickerModel;
use crate::picker::PickerError;

const COL_NAME: usize = 0;
const COL_COORDS: usize = 1;
const COL_ID: usize = 2;

/// Plain picker model.
///
/// Micrographs are either added directly or built from
/// [`MicrographSource`] pairs, in which case the coordinate file of each
/// micrograph is read the first time its coordinates are needed. Labels
/// found in the files are registered on demand.
#[derive(Debug, Clone, Default)]
pub struct SimplePickerModel {
    core: PickerCore,
    coord_files: HashMap<MicrographId, PathBuf>,
    strictness: Strictness,
}

impl SimplePickerModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a model from paired micrograph and coordinate files.
    ///
    /// Ids are assigned sequentially from 1 in source order.
    pub fn from_sources(sources: Vec<MicrographSource>, strictness: Strictness) -> Self {
        let mut model = Self {
            strictness,
            ..Self::default()
        };
        for source in sources {
            let id = model.core.next_id();
            if let Some(coords) = source.coordinates {
                model.coord_files.insert(id, coords);
            }
            model.core.add_micrograph(Micrograph::new(id, source.micrograph));
        }
        log::info!(
            "Simple picker model with {} micrographs ({} with coordinate files)",
            model.core.len(),
            model.coord_files.len()
        );
        model
    }

    pub fn strictness(&self) -> Strictness {
        self.strictness
    }

    pub fn set_strictness(&mut self, strictness: Strictness) {
        self.strictness = strictness;
    }

    /// Coordinate file associated with a micrograph, if any.
    pub fn coordinate_file(&self, id: MicrographId) -> Option<&PathBuf> {
        self.coord_files.get(&id)
    }

    fn ensure_loaded(&mut self, id: MicrographId) -> Result<(), PickerError> {
        if self.core.require(id)?.is_loaded() {
            return Ok(());
        }

        let coordinates = match self.coord_files.get(&id) {
            Some(path) if path.exists() => {
                let start = Instant::now();
                let file = read_coordinates(path, self.strictness)?;
                log::debug!(
                    "Loaded {} coordinates from {:?} in {:?}",
                    file.coordinates.len(),
                    path,
                    start.elapsed()
                );
                file.coordinates
            }
            Some(path) => {
                log::debug!("Coordinate file {:?} not found, no picks for micrograph {}", path, id);
                Vec::new()
            }
            None => Vec::new(),
        };

        self.core.register_labels(&coordinates);
        let mic = self.core.require_mut(id)?;
        mic.extend(coordinates);
        mic.set_state(LoadState::Loaded);
        Ok(())
    }
}

impl PickerModel for SimplePickerModel {
    fn core(&self) -> &PickerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PickerCore {
        &mut self.core
    }

    fn add_coordinates(
        &mut self,
        id: MicrographId,
        coordinates: Vec<Coordinate>,
    ) -> Result<(), PickerError> {
        self.ensure_loaded(id)?;
        self.core.add_coordinates(id, coordinates)
    }

    fn coordinates(&mut self, id: MicrographId) -> Result<&[Coordinate], PickerError> {
        self.ensure_loaded(id)?;
        Ok(self.core.require(id)?.coordinates())
    }

    fn params(&self) -> Form {
        Form::new(vec![vec![
            Param::button(ParamId::PickAgain, "Pick Again")
                .with_help("Discard the current picks and read them again"),
            Param::button(ParamId::Clear, "Clear")
                .with_help("Remove all coordinates of this micrograph"),
        ]])
    }

    fn apply_param(
        &mut self,
        id: MicrographId,
        param: ParamId,
        _value: &ParamValue,
        _values: &dyn Fn() -> ParamValues,
    ) -> Result<ChangeResult, PickerError> {
        match param {
            ParamId::Clear => {
                self.core.clear_micrograph(id)?;
                Ok(ChangeResult::changed())
            }
            ParamId::PickAgain => {
                let mic = self.core.require_mut(id)?;
                mic.clear();
                mic.set_state(LoadState::Unloaded);
                Ok(ChangeResult::changed())
            }
            ParamId::ScoreThreshold
            | ParamId::UseColor
            | ParamId::ShowBelow
            | ParamId::Sources
            | ParamId::Threshold => Ok(ChangeResult::unchanged()),
        }
    }

    fn columns(&self) -> Vec<ColumnConfig> {
        vec![
            ColumnConfig::new("Micrograph", DataType::String),
            ColumnConfig::new("Coordinates", DataType::Int),
            ColumnConfig::new("Id", DataType::Int).hidden(),
        ]
    }

    fn value(&mut self, row: usize, col: usize) -> Result<Value, PickerError> {
        let mic = self.core.require_row(row)?;
        let id = mic.id();
        match col {
            COL_NAME => Ok(Value::Str(mic.name())),
            COL_COORDS => Ok(self.coordinates(id)?.len().into()),
            COL_ID => Ok(Value::Int(i64::from(id.0))),
            _ => Err(PickerError::InvalidColumn(col)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(dir: &std::path::Path, stem: &str, coords: Option<&str>) -> MicrographSource {
        let coordinates = coords.map(|content| {
            let path = dir.join(format!("{stem}.txt"));
            std::fs::write(&path, content).unwrap();
            path
        });
        MicrographSource {
            stem: stem.to_string(),
            micrograph: dir.join(format!("{stem}.mrc")),
            coordinates,
        }
    }

    #[test]
    fn test_lazy_load_registers_labels() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![
            source(dir.path(), "001", Some("10 20 good\n30 40 bad\n50 60\n")),
            source(dir.path(), "002", None),
        ];
        let mut model = SimplePickerModel::from_sources(sources, Strictness::Strict);

        assert_eq!(model.rows_count(), 2);
        assert!(model.labels().is_empty());
        assert!(!model.micrograph(MicrographId(1)).unwrap().is_loaded());

        assert_eq!(model.coordinates(MicrographId(1)).unwrap().len(), 3);
        assert!(model.labels().contains("good"));
        assert!(model.labels().contains("bad"));
        assert_eq!(model.iter_coordinates(MicrographId(2)).unwrap().count(), 0);
    }

    #[test]
    fn test_strict_file_error_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![source(dir.path(), "001", Some("1 2\n1 2 3 4 5 6\n"))];
        let mut strict = SimplePickerModel::from_sources(sources.clone(), Strictness::Strict);
        assert!(matches!(
            strict.coordinates(MicrographId(1)),
            Err(PickerError::Format(_))
        ));

        let mut lenient = SimplePickerModel::from_sources(sources, Strictness::Permissive);
        assert_eq!(lenient.coordinates(MicrographId(1)).unwrap().len(), 1);
    }

    #[test]
    fn test_add_before_first_load_keeps_file_rows() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![source(dir.path(), "001", Some("1 1\n2 2\n"))];
        let mut model = SimplePickerModel::from_sources(sources, Strictness::Strict);

        let c = model.create_coordinate(5, 5, Some("manual"));
        model.add_coordinates(MicrographId(1), vec![c]).unwrap();
        assert_eq!(model.coordinates(MicrographId(1)).unwrap().len(), 3);
        assert_eq!(model.value(0, COL_COORDS).unwrap(), Value::Int(3));
    }

    #[test]
    fn test_pick_again_rereads_file() {
        let dir = tempfile::tempdir().unwrap();
        let sources = vec![source(dir.path(), "001", Some("1 1\n"))];
        let mut model = SimplePickerModel::from_sources(sources, Strictness::Strict);
        let id = MicrographId(1);
        let no_values = || ParamValues::new();

        model.change_param(id, "clear", &ParamValue::None, &no_values).unwrap();
        assert_eq!(model.coordinates(id).unwrap().len(), 0);

        let result = model.change_param(id, "pick", &ParamValue::None, &no_values).unwrap();
        assert!(result.current_coords_changed && result.table_model_changed);
        assert_eq!(model.coordinates(id).unwrap().len(), 1);
    }

    #[test]
    fn test_columns_and_invalid_column() {
        let mut model = SimplePickerModel::new();
        model.add_micrograph(Micrograph::new(MicrographId(7), "/data/a.mrc")).unwrap();

        assert_eq!(model.columns().len(), 3);
        assert!(!model.columns()[COL_ID].visible);
        assert_eq!(model.value(0, COL_NAME).unwrap(), Value::Str("a.mrc".into()));
        assert_eq!(model.value(0, COL_ID).unwrap(), Value::Int(7));
        assert!(matches!(model.value(0, 9), Err(PickerError::InvalidColumn(9))));
        assert!(matches!(model.value(3, 0), Err(PickerError::InvalidRow { row: 3, rows: 1 })));
    }
}
