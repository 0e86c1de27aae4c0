//! Side-by-side comparison of two picking runs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{Coordinate, Label, Micrograph, MicrographId, ORIGIN_RUN_KEY};
use crate::picker::base::PickerCore;
use crate::picker::params::{
    resolve_bool, resolve_f64, resolve_value, ChangeResult, Form, Param, ParamId, ParamKind,
    ParamValue, ParamValues,
};
use crate::picker::table::{ColumnConfig, DataType, Value};
use crate::picker::traits::{CoordIter, PickerModel};
use crate::picker::PickerError;

const DEFAULT_SCORE_THRESHOLD: f64 = 0.5;
const MAX_SCORE_THRESHOLD: f64 = 10.0;

const COL_NAME: usize = 0;
const COL_A: usize = 1;
const COL_B: usize = 2;
const COL_A_AND_B: usize = 3;
const COL_BELOW: usize = 4;

/// How micrographs of the second run are matched to rows of the primary run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MicrographMatching {
    /// Same row position in both runs
    #[default]
    Index,
    /// Same micrograph file name
    Basename,
}

/// Which run(s) are displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sources {
    #[default]
    Both,
    A,
    B,
}

impl Sources {
    pub fn name(&self) -> &'static str {
        match self {
            Sources::Both => "Both",
            Sources::A => "A",
            Sources::B => "B",
        }
    }

    pub fn all() -> &'static [Sources] {
        &[Sources::Both, Sources::A, Sources::B]
    }

    pub fn from_name(name: &str) -> Option<Sources> {
        Self::all().iter().copied().find(|s| s.name() == name)
    }

    /// Index of the single selected run.
    fn run(&self) -> Option<usize> {
        match self {
            Sources::Both => None,
            Sources::A => Some(0),
            Sources::B => Some(1),
        }
    }
}

/// Display labels of the two runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunLabels {
    pub a: Label,
    pub b: Label,
}

impl Default for RunLabels {
    fn default() -> Self {
        Self {
            a: Label::new("A", "#1EFF00"),
            b: Label::new("B", "#FF0000"),
        }
    }
}

/// Count one-to-one matches between two pick sets.
///
/// Pairs closer than `radius` are matched greedily from the closest pair
/// up; every pick takes part in at most one match.
pub fn count_matches(a: &[Coordinate], b: &[Coordinate], radius: f64) -> usize {
    let mut pairs: Vec<(f64, usize, usize)> = Vec::new();
    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            let d = ca.distance_to(cb);
            if d <= radius {
                pairs.push((d, i, j));
            }
        }
    }
    pairs.sort_by(|x, y| x.0.total_cmp(&y.0));

    let mut used_a = vec![false; a.len()];
    let mut used_b = vec![false; b.len()];
    let mut matches = 0;
    for (_, i, j) in pairs {
        if !used_a[i] && !used_b[j] {
            used_a[i] = true;
            used_b[j] = true;
            matches += 1;
        }
    }
    matches
}

/// Comparison of two picking runs over the same micrographs.
///
/// The run with more rows is the primary run `A` and drives the row order
/// and micrograph ids; its counterpart in run `B` is resolved with the
/// configured [`MicrographMatching`]. Micrographs missing from `B` count as
/// having no picks.
pub struct PickerCmpModel {
    core: PickerCore,
    models: [Box<dyn PickerModel>; 2],
    run_labels: RunLabels,
    matching: MicrographMatching,
    /// Counterpart in run B of each primary row
    counterparts: Vec<Option<MicrographId>>,
    /// Tagged picks of the displayed run(s), per primary micrograph.
    /// Several primary rows may share one counterpart, so edits drop all of it.
    merged: HashMap<MicrographId, Vec<Coordinate>>,
    sources: Sources,
    score_threshold: f64,
    show_below: bool,
}

impl PickerCmpModel {
    /// Compare two runs. The larger one becomes run `A`; on a tie the first
    /// argument does.
    pub fn new(
        first: Box<dyn PickerModel>,
        second: Box<dyn PickerModel>,
        matching: MicrographMatching,
    ) -> Self {
        Self::with_labels(first, second, matching, RunLabels::default())
    }

    pub fn with_labels(
        first: Box<dyn PickerModel>,
        second: Box<dyn PickerModel>,
        matching: MicrographMatching,
        run_labels: RunLabels,
    ) -> Self {
        let models = if second.rows_count() > first.rows_count() {
            [second, first]
        } else {
            [first, second]
        };

        let mut core = PickerCore::new();
        core.set_box_size(models[0].box_size());
        core.labels_mut().register(run_labels.a.clone());
        core.labels_mut().register(run_labels.b.clone());

        let counterparts = resolve_counterparts(models[0].as_ref(), models[1].as_ref(), matching);
        let missing = counterparts.iter().filter(|c| c.is_none()).count();
        log::info!(
            "Comparing runs with {} and {} micrographs ({:?} matching, {} without counterpart)",
            models[0].rows_count(),
            models[1].rows_count(),
            matching,
            missing
        );

        Self {
            core,
            models,
            run_labels,
            matching,
            counterparts,
            merged: HashMap::new(),
            sources: Sources::default(),
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            show_below: true,
        }
    }

    /// Run `A`, the one with more micrographs.
    pub fn primary(&self) -> &dyn PickerModel {
        self.models[0].as_ref()
    }

    /// Run `B`.
    pub fn secondary(&self) -> &dyn PickerModel {
        self.models[1].as_ref()
    }

    pub fn matching(&self) -> MicrographMatching {
        self.matching
    }

    pub fn sources(&self) -> Sources {
        self.sources
    }

    pub fn set_sources(&mut self, sources: Sources) {
        if sources != self.sources {
            self.sources = sources;
            self.merged.clear();
        }
    }

    pub fn score_threshold(&self) -> f64 {
        self.score_threshold
    }

    pub fn show_below(&self) -> bool {
        self.show_below
    }

    /// Micrograph of run `B` matched to a primary micrograph.
    pub fn counterpart(&self, id: MicrographId) -> Option<MicrographId> {
        let row = self.models[0].core().index_of(id)?;
        self.counterparts.get(row).copied().flatten()
    }

    /// Run index and micrograph id addressed by an edit of `id`.
    fn edit_target(
        &self,
        operation: &str,
        id: MicrographId,
    ) -> Result<(usize, MicrographId), PickerError> {
        let run = self.sources.run().ok_or_else(|| {
            PickerError::unsupported(operation, "select a single run to edit its picks")
        })?;
        let target = if run == 0 {
            self.models[0].core().require(id)?.id()
        } else {
            self.counterpart(id)
                .ok_or(PickerError::MicrographNotFound(id))?
        };
        Ok((run, target))
    }

    /// Raw picks of one run for a primary micrograph.
    fn run_coordinates(
        &mut self,
        run: usize,
        id: MicrographId,
    ) -> Result<&[Coordinate], PickerError> {
        let target = if run == 0 { Some(id) } else { self.counterpart(id) };
        match target {
            Some(target) => self.models[run].coordinates(target),
            None => Ok(&[]),
        }
    }

    fn tagged(&mut self, run: usize, id: MicrographId) -> Result<Vec<Coordinate>, PickerError> {
        let label = if run == 0 {
            self.run_labels.a.name.clone()
        } else {
            self.run_labels.b.name.clone()
        };
        Ok(self
            .run_coordinates(run, id)?
            .iter()
            .map(|c| {
                c.clone()
                    .with_label(label.clone())
                    .with_extra(ORIGIN_RUN_KEY, label.clone())
            })
            .collect())
    }
}

fn resolve_counterparts(
    primary: &dyn PickerModel,
    secondary: &dyn PickerModel,
    matching: MicrographMatching,
) -> Vec<Option<MicrographId>> {
    let primary_mics = primary.core().micrographs();
    match matching {
        MicrographMatching::Index => (0..primary_mics.len())
            .map(|row| secondary.micrograph_by_index(row).map(Micrograph::id))
            .collect(),
        MicrographMatching::Basename => {
            let by_name: HashMap<String, MicrographId> = secondary
                .core()
                .micrographs()
                .iter()
                .map(|m| (m.name(), m.id()))
                .collect();
            primary_mics
                .iter()
                .map(|m| by_name.get(&m.name()).copied())
                .collect()
        }
    }
}

impl PickerModel for PickerCmpModel {
    fn core(&self) -> &PickerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PickerCore {
        &mut self.core
    }

    fn set_box_size(&mut self, size: u32) {
        self.core.set_box_size(size);
        for model in &mut self.models {
            model.set_box_size(size);
        }
    }

    fn micrograph(&self, id: MicrographId) -> Option<&Micrograph> {
        self.models[0].micrograph(id)
    }

    fn micrograph_by_index(&self, row: usize) -> Option<&Micrograph> {
        self.models[0].micrograph_by_index(row)
    }

    fn rows_count(&self) -> usize {
        self.models[0].rows_count()
    }

    fn add_micrograph(&mut self, _micrograph: Micrograph) -> Result<(), PickerError> {
        Err(PickerError::unsupported(
            "add_micrograph",
            "micrographs of a comparison come from its runs",
        ))
    }

    fn create_coordinate(&self, x: i32, y: i32, label: Option<&str>) -> Coordinate {
        let run = self.sources.run().unwrap_or(0);
        self.models[run].create_coordinate(x, y, label)
    }

    fn add_coordinates(
        &mut self,
        id: MicrographId,
        coordinates: Vec<Coordinate>,
    ) -> Result<(), PickerError> {
        let (run, target) = self.edit_target("add_coordinates", id)?;
        self.models[run].add_coordinates(target, coordinates)?;
        self.merged.clear();
        Ok(())
    }

    fn clear_micrograph(&mut self, id: MicrographId) -> Result<(), PickerError> {
        let (run, target) = self.edit_target("clear_micrograph", id)?;
        self.models[run].clear_micrograph(target)?;
        self.merged.clear();
        Ok(())
    }

    fn remove_coordinates(
        &mut self,
        id: MicrographId,
        indices: &[usize],
    ) -> Result<Vec<Coordinate>, PickerError> {
        let (run, target) = self.edit_target("remove_coordinates", id)?;
        let removed = self.models[run].remove_coordinates(target, indices)?;
        self.merged.clear();
        Ok(removed)
    }

    fn coordinates(&mut self, id: MicrographId) -> Result<&[Coordinate], PickerError> {
        if !self.merged.contains_key(&id) {
            self.models[0].core().require(id)?;
            let mut coords = Vec::new();
            if self.sources != Sources::B {
                coords.extend(self.tagged(0, id)?);
            }
            if self.sources != Sources::A {
                coords.extend(self.tagged(1, id)?);
            }
            self.merged.insert(id, coords);
        }
        Ok(self.merged.get(&id).map(Vec::as_slice).unwrap_or_default())
    }

    fn iter_coordinates(&mut self, id: MicrographId) -> Result<CoordIter<'_>, PickerError> {
        let threshold = self.score_threshold;
        let show_below = self.show_below;
        let coords = self.coordinates(id)?;
        Ok(Box::new(
            coords
                .iter()
                .filter(move |c| show_below || c.score > threshold)
                .cloned(),
        ))
    }

    fn params(&self) -> Form {
        let choices: Vec<&str> = Sources::all().iter().map(Sources::name).collect();
        let sources = Param::new(
            ParamId::Sources,
            ParamKind::Enum,
            ParamValue::Text(self.sources.name().to_string()),
        )
        .with_label("Show")
        .with_help("Run(s) whose coordinates are displayed and edited")
        .choices(&choices);
        let threshold = Param::new(
            ParamId::ScoreThreshold,
            ParamKind::Float,
            ParamValue::Float(self.score_threshold),
        )
        .with_label("Score threshold")
        .slider(0.0, MAX_SCORE_THRESHOLD);
        let show_below = Param::new(
            ParamId::ShowBelow,
            ParamKind::Bool,
            ParamValue::Bool(self.show_below),
        )
        .with_label("Show coordinates below threshold");

        Form::new(vec![
            vec![sources],
            vec![threshold, show_below],
            vec![
                Param::button(ParamId::PickAgain, "Pick Again"),
                Param::button(ParamId::Clear, "Clear coordinates"),
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
            ParamId::Sources => {
                let resolved = resolve_value(param, value, values);
                let sources = resolved
                    .as_str()
                    .and_then(Sources::from_name)
                    .ok_or_else(|| {
                        PickerError::invalid_param(param.name(), "expected Both, A or B")
                    })?;
                if sources == self.sources {
                    return Ok(ChangeResult::unchanged());
                }
                self.set_sources(sources);
                Ok(ChangeResult::coords_only())
            }
            ParamId::ScoreThreshold => {
                self.score_threshold = resolve_f64(param, value, values)?;
                Ok(ChangeResult::changed())
            }
            ParamId::ShowBelow => {
                self.show_below = resolve_bool(param, value, values)?;
                Ok(ChangeResult::coords_only())
            }
            ParamId::Clear | ParamId::PickAgain => {
                let (run, target) = self.edit_target(param.name(), id)?;
                let result = self.models[run].apply_param(target, param, value, values)?;
                self.merged.clear();
                Ok(result)
            }
            ParamId::UseColor | ParamId::Threshold => Ok(ChangeResult::unchanged()),
        }
    }

    fn columns(&self) -> Vec<ColumnConfig> {
        vec![
            ColumnConfig::new("Micrograph", DataType::String),
            ColumnConfig::new(&self.run_labels.a.name, DataType::Int),
            ColumnConfig::new(&self.run_labels.b.name, DataType::Int),
            ColumnConfig::new(
                &format!("{}n{}", self.run_labels.a.name, self.run_labels.b.name),
                DataType::Int,
            ),
            ColumnConfig::new("Below Threshold", DataType::Int),
        ]
    }

    fn value(&mut self, row: usize, col: usize) -> Result<Value, PickerError> {
        let mic = self.models[0].core().require_row(row)?;
        let id = mic.id();
        match col {
            COL_NAME => Ok(Value::Str(mic.name())),
            COL_A => Ok(self.run_coordinates(0, id)?.len().into()),
            COL_B => Ok(self.run_coordinates(1, id)?.len().into()),
            COL_A_AND_B => {
                let radius = f64::from(self.core.box_size()) / 2.0;
                let a = self.run_coordinates(0, id)?.to_vec();
                let b = self.run_coordinates(1, id)?;
                Ok(count_matches(&a, b, radius).into())
            }
            COL_BELOW => {
                let threshold = self.score_threshold;
                let mut below = 0;
                for run in 0..2 {
                    below += self
                        .run_coordinates(run, id)?
                        .iter()
                        .filter(|c| c.score <= threshold)
                        .count();
                }
                Ok(below.into())
            }
            _ => Err(PickerError::InvalidColumn(col)),
        }
    }
}
