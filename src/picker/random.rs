//! Synthetic picker model with seeded random picks.

use serde::{Deserialize, Serialize};

use crate::model::{Coordinate, Label, LoadState, Micrograph, MicrographId};
use crate::picker::base::PickerCore;
use crate::picker::params::{
    resolve_value, ChangeResult, Form, Param, ParamId, ParamKind, ParamValue, ParamValues,
};
use crate::picker::table::{ColumnConfig, DataType, Value};
use crate::picker::traits::{CoordIter, PickerModel};
use crate::picker::PickerError;

/// Label of generated picks.
pub const AUTO_LABEL: &str = "0";
/// Label of picks added by the user.
pub const MANUAL_LABEL: &str = "M";

/// Threshold attached to user-created filaments so they are always shown.
const FILAMENT_THRESHOLD: i32 = 100;
const MAX_THRESHOLD: i32 = 100;
const MIN_SEGMENT: f64 = 40.0;
const MAX_SEGMENT: f64 = 400.0;

/// Geometry of generated picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickShape {
    /// Single-point particles
    #[default]
    Point,
    /// Filament segments with two end points
    Segment,
}

impl PickShape {
    pub fn name(&self) -> &'static str {
        match self {
            PickShape::Point => "point",
            PickShape::Segment => "segment",
        }
    }
}

/// Picker model whose picks are generated instead of read from disk.
///
/// Picks of a micrograph are generated on first access from a generator
/// seeded with the model seed and the micrograph id, so they are the same
/// however often or in whatever order micrographs are visited.
#[derive(Debug, Clone)]
pub struct RandomPickerModel {
    core: PickerCore,
    seed: u64,
    shape: PickShape,
    picks_per_micrograph: usize,
    image_size: (u32, u32),
    threshold: i32,
}

impl RandomPickerModel {
    /// Create `micrographs` synthetic micrographs of `image_size` pixels.
    pub fn new(
        micrographs: usize,
        picks_per_micrograph: usize,
        shape: PickShape,
        image_size: (u32, u32),
        seed: u64,
    ) -> Self {
        let mut core = PickerCore::new();
        core.labels_mut().register(Label::new(AUTO_LABEL, "#1EFF00"));
        core.labels_mut().register(Label::new(MANUAL_LABEL, "#00A2FF"));
        for i in 0..micrographs {
            let id = core.next_id();
            core.add_micrograph(Micrograph::new(id, format!("synthetic_{:03}.mrc", i + 1)));
        }

        Self {
            core,
            seed,
            shape,
            picks_per_micrograph,
            image_size,
            threshold: 0,
        }
    }

    pub fn shape(&self) -> PickShape {
        self.shape
    }

    pub fn threshold(&self) -> i32 {
        self.threshold
    }

    fn generate(&self, id: MicrographId) -> Vec<Coordinate> {
        let mix = u64::from(id.0).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let mut rng = fastrand::Rng::with_seed(self.seed ^ mix);
        let (width, height) = (self.image_size.0.max(1), self.image_size.1.max(1));

        (0..self.picks_per_micrograph)
            .map(|_| {
                let x = rng.u32(0..width) as i32;
                let y = rng.u32(0..height) as i32;
                let threshold = rng.i32(0..=MAX_THRESHOLD);
                let coord = match self.shape {
                    PickShape::Point => Coordinate::new(x, y),
                    PickShape::Segment => {
                        let angle = rng.f64() * std::f64::consts::TAU;
                        let length = MIN_SEGMENT + rng.f64() * (MAX_SEGMENT - MIN_SEGMENT);
                        let x2 = (x as f64 + angle.cos() * length).round() as i32;
                        let y2 = (y as f64 + angle.sin() * length).round() as i32;
                        Coordinate::segment(
                            x,
                            y,
                            x2.clamp(0, width as i32),
                            y2.clamp(0, height as i32),
                        )
                    }
                };
                coord
                    .with_label(AUTO_LABEL)
                    .with_threshold(threshold)
                    .with_score(f64::from(threshold) / f64::from(MAX_THRESHOLD))
            })
            .collect()
    }

    fn ensure_loaded(&mut self, id: MicrographId) -> Result<(), PickerError> {
        if self.core.require(id)?.is_loaded() {
            return Ok(());
        }
        let picks = self.generate(id);
        log::debug!("Generated {} picks for micrograph {}", picks.len(), id);
        let mic = self.core.require_mut(id)?;
        mic.extend(picks);
        mic.set_state(LoadState::Loaded);
        Ok(())
    }
}

impl PickerModel for RandomPickerModel {
    fn core(&self) -> &PickerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PickerCore {
        &mut self.core
    }

    fn create_coordinate(&self, x: i32, y: i32, label: Option<&str>) -> Coordinate {
        let threshold = match self.shape {
            PickShape::Segment => FILAMENT_THRESHOLD,
            PickShape::Point => fastrand::i32(0..=MAX_THRESHOLD),
        };
        Coordinate::new(x, y)
            .with_label(label.unwrap_or(MANUAL_LABEL))
            .with_threshold(threshold)
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

    fn iter_coordinates(&mut self, id: MicrographId) -> Result<CoordIter<'_>, PickerError> {
        let threshold = self.threshold;
        let coords = self.coordinates(id)?;
        Ok(Box::new(
            coords
                .iter()
                .filter(move |c| c.threshold.unwrap_or(MAX_THRESHOLD) >= threshold)
                .cloned(),
        ))
    }

    fn params(&self) -> Form {
        let threshold = Param::new(
            ParamId::Threshold,
            ParamKind::Int,
            ParamValue::Int(i64::from(self.threshold)),
        )
        .with_label("Threshold")
        .with_help("Hide picks whose threshold is below this value")
        .slider(0.0, f64::from(MAX_THRESHOLD));

        Form::new(vec![
            vec![threshold],
            vec![
                Param::button(ParamId::PickAgain, "Pick Again"),
                Param::button(ParamId::Clear, "Clear"),
            ],
        ])
    }

    fn apply_param(
        &mut self,
        id: MicrographId,
        param: ParamId,
        value: &ParamValue,
        values: &dyn Fn() -> ParamValues,
    ) -> Result<ChangeResult, PickerError> {
        match param {
            ParamId::Threshold => {
                let threshold = resolve_value(param, value, values)
                    .as_i64()
                    .ok_or_else(|| {
                        PickerError::invalid_param(param.name(), "expected an integer")
                    })?;
                let threshold = threshold.clamp(0, i64::from(MAX_THRESHOLD)) as i32;
                if threshold == self.threshold {
                    return Ok(ChangeResult::unchanged());
                }
                self.threshold = threshold;
                Ok(ChangeResult::coords_only())
            }
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
            ParamId::ScoreThreshold | ParamId::UseColor | ParamId::ShowBelow | ParamId::Sources => {
                Ok(ChangeResult::unchanged())
            }
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
            0 => Ok(Value::Str(mic.name())),
            1 => Ok(self.coordinates(id)?.len().into()),
            2 => Ok(Value::Int(i64::from(id.0))),
            _ => Err(PickerError::InvalidColumn(col)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(shape: PickShape) -> RandomPickerModel {
        RandomPickerModel::new(4, 25, shape, (1024, 1024), 42)
    }

    #[test]
    fn test_generation_is_stable_per_micrograph() {
        let mut a = model(PickShape::Point);
        let mut b = model(PickShape::Point);

        // Different visiting order, same picks
        let b_second = b.coordinates(MicrographId(2)).unwrap().to_vec();
        let a_first = a.coordinates(MicrographId(1)).unwrap().to_vec();
        let a_second = a.coordinates(MicrographId(2)).unwrap().to_vec();
        assert_eq!(a_second, b_second);
        assert_eq!(a_first.len(), 25);
        assert_ne!(a_first, a_second);
    }

    #[test]
    fn test_added_labels_are_registered() {
        let mut m = model(PickShape::Point);
        let id = MicrographId(4);
        let pick = m.create_coordinate(3, 4, Some("ice"));
        m.add_coordinates(id, vec![pick]).unwrap();

        assert!(m.labels().contains("ice"));
        assert_eq!(m.coordinates(id).unwrap().len(), 26);
    }

    #[test]
    fn test_picks_stay_inside_image() {
        let mut m = model(PickShape::Segment);
        let coords = m.coordinates(MicrographId(3)).unwrap();
        for c in coords {
            assert!(c.is_segment());
            assert!((0..1024).contains(&c.x) && (0..1024).contains(&c.y));
            let (x2, y2) = c.end.unwrap();
            assert!((0..=1024).contains(&x2) && (0..=1024).contains(&y2));
        }
    }

    #[test]
    fn test_threshold_hides_low_picks() {
        let mut m = model(PickShape::Point);
        let id = MicrographId(1);
        let none = || ParamValues::new();
        let mut last = m.iter_coordinates(id).unwrap().count();
        assert_eq!(last, 25);

        for t in [10, 30, 50, 80, 100] {
            let result = m
                .change_param(id, "threshold", &ParamValue::Int(t), &none)
                .unwrap();
            assert!(result.current_coords_changed);
            let count = m.iter_coordinates(id).unwrap().count();
            assert!(count <= last);
            last = count;
        }
        assert!(m.iter_coordinates(id).unwrap().all(|c| c.threshold == Some(100)));
    }

    #[test]
    fn test_filament_coordinates_have_fixed_threshold() {
        let m = model(PickShape::Segment);
        let c = m.create_coordinate(10, 10, None);
        assert_eq!(c.threshold, Some(FILAMENT_THRESHOLD));
        assert_eq!(c.label.as_deref(), Some(MANUAL_LABEL));

        let p = model(PickShape::Point).create_coordinate(1, 1, Some("0"));
        assert!((0..=MAX_THRESHOLD).contains(&p.threshold.unwrap()));
    }

    #[test]
    fn test_non_applicable_params_do_nothing() {
        let mut m = model(PickShape::Point);
        let none = || ParamValues::new();
        let result = m
            .change_param(MicrographId(1), "scoreThreshold", &ParamValue::Float(3.0), &none)
            .unwrap();
        assert!(result.is_unchanged());
        assert!(!m.micrograph(MicrographId(1)).unwrap().is_loaded());
    }
}
