//! Picker model over the output of one RELION picking run.
//!
//! Two directory layouts are understood:
//!
//! - a picking job (`AutoPick/jobNNN/`) holding `note.txt`, `summary.star`
//!   and `Movies/<stem>_autopick.star` files, see [`RelionPickerModel::open`]
//! - a project root plus picking path and micrographs STAR file, see
//!   [`RelionPickerModel::from_project`]
//!
//! Coordinate files are only read when a micrograph's picks are first
//! needed. A missing coordinate file means the micrograph has no picks.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use web_time::Instant;

use crate::format::{FormatError, StarFile};
use crate::model::{Coordinate, Label, LoadState, Micrograph, MicrographId};
use crate::picker::base::PickerCore;
use crate::picker::params::{
    resolve_bool, resolve_f64, ChangeResult, Form, Param, ParamId, ParamKind, ParamValue,
    ParamValues,
};
use crate::picker::table::{ColumnConfig, DataType, Value};
use crate::picker::traits::{CoordIter, PickerModel};
use crate::picker::PickerError;

/// Label of picks above the score threshold.
pub const PASS_LABEL: &str = "0";
/// Label of picks at or below the score threshold.
pub const FAIL_LABEL: &str = "1";

const FIELD_MIC_NAME: &str = "rlnMicrographName";
const FIELD_FOM: &str = "rlnAutopickFigureOfMerit";
const FIELD_NR_PARTICLES: &str = "rlnGroupNrParticles";
const FIELD_X: &str = "rlnCoordinateX";
const FIELD_Y: &str = "rlnCoordinateY";

/// Upper end of the score threshold slider.
const MAX_SCORE_THRESHOLD: f64 = 10.0;
/// Score of picks added by hand, always above any threshold.
const MANUAL_SCORE: f64 = f64::MAX;

/// File names and defaults of a RELION run directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelionLayout {
    /// Job note, required to accept a directory as a picking job
    pub note_file: String,
    /// Per-micrograph summary of a picking job
    pub summary_file: String,
    /// Subdirectory holding the per-micrograph coordinate files
    pub coordinates_dir: String,
    /// Block of the micrographs STAR file listing the micrographs
    pub micrographs_block: String,
    /// Box size used for the run
    pub box_size: u32,
}

impl Default for RelionLayout {
    fn default() -> Self {
        Self {
            note_file: "note.txt".to_string(),
            summary_file: "summary.star".to_string(),
            coordinates_dir: "Movies".to_string(),
            micrographs_block: "micrographs".to_string(),
            box_size: 64,
        }
    }
}

/// Kind of picking that produced the coordinate files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickKind {
    Auto,
    Manual,
}

impl PickKind {
    /// Guess from the picking path: RELION puts automatic picking jobs under `AutoPick`.
    pub fn from_picking_path(path: &Path) -> Self {
        if path.to_string_lossy().contains("AutoPick") {
            PickKind::Auto
        } else {
            PickKind::Manual
        }
    }

    /// Suffix of coordinate file names, `<stem>_<suffix>.star`.
    pub fn suffix(&self) -> &'static str {
        match self {
            PickKind::Auto => "autopick",
            PickKind::Manual => "manualpick",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SummaryEntry {
    fom: f64,
    particles: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Name,
    Fom,
    Coordinates,
    Id,
}

/// Picker model of one RELION picking run.
#[derive(Debug, Clone)]
pub struct RelionPickerModel {
    core: PickerCore,
    /// Directory holding the coordinates subdirectory
    run_dir: PathBuf,
    layout: RelionLayout,
    kind: PickKind,
    /// Summary rows, parallel to the micrograph list (job layout only)
    summary: Option<Vec<SummaryEntry>>,
    score_threshold: f64,
    use_color: bool,
}

impl RelionPickerModel {
    fn empty(run_dir: PathBuf, layout: RelionLayout, kind: PickKind) -> Self {
        let mut core = PickerCore::new();
        core.set_box_size(layout.box_size);
        let labels = core.labels_mut();
        labels.register(Label::new(PASS_LABEL, "#1EFF00"));
        labels.register(Label::new(FAIL_LABEL, "#DD0014"));
        labels.alias("D", PASS_LABEL);

        Self {
            core,
            run_dir,
            layout,
            kind,
            summary: None,
            score_threshold: 0.0,
            use_color: false,
        }
    }

    /// Open a picking job directory.
    ///
    /// The note and summary files must exist. Micrograph paths from the
    /// summary are resolved against the first ancestor of the job directory
    /// under which the first micrograph exists.
    pub fn open(job_dir: &Path, layout: RelionLayout) -> Result<Self, PickerError> {
        let start = Instant::now();
        let note = job_dir.join(&layout.note_file);
        if !note.exists() {
            return Err(FormatError::missing_file(note).into());
        }
        let star = StarFile::read(&job_dir.join(&layout.summary_file))?;
        let table = star.first()?;

        let mut model = Self::empty(job_dir.to_path_buf(), layout, PickKind::Auto);
        let mut summary = Vec::with_capacity(table.len());
        let mut prefix: Option<PathBuf> = None;

        for row in table.rows() {
            let name = row.str(FIELD_MIC_NAME)?;
            let root = match &prefix {
                Some(root) => root.clone(),
                None => {
                    let root = find_image_prefix(name, job_dir)?;
                    log::debug!("Resolving micrographs of {:?} under {:?}", job_dir, root);
                    prefix = Some(root.clone());
                    root
                }
            };

            let id = model.core.next_id();
            model.core.add_micrograph(Micrograph::new(id, root.join(name)));
            summary.push(SummaryEntry {
                fom: row.f64(FIELD_FOM)?,
                particles: row.i64(FIELD_NR_PARTICLES)?,
            });
        }
        model.summary = Some(summary);

        log::info!(
            "Opened picking job {:?}: {} micrographs in {:?}",
            job_dir,
            model.core.len(),
            start.elapsed()
        );
        Ok(model)
    }

    /// Open a run from a project root, a picking path and a micrographs STAR
    /// file relative to the project root.
    ///
    /// Every micrograph must exist under the project root or the picking path.
    /// A relative picking path is taken relative to the project root.
    pub fn from_project(
        project: &Path,
        picking: &Path,
        micrographs_star: &Path,
        layout: RelionLayout,
    ) -> Result<Self, PickerError> {
        let start = Instant::now();
        let star_path = project.join(micrographs_star);
        if !star_path.exists() {
            return Err(FormatError::missing_file(star_path).into());
        }
        let picking = if picking.is_relative() {
            project.join(picking)
        } else {
            picking.to_path_buf()
        };
        let kind = PickKind::from_picking_path(&picking);

        log::info!("Reading micrographs from {:?}", star_path);
        let star = StarFile::read(&star_path)?;
        let table = star.block_or_first(&layout.micrographs_block)?;

        let mut model = Self::empty(picking.clone(), layout, kind);
        for row in table.rows() {
            let name = row.str(FIELD_MIC_NAME)?;
            let path = [project.join(name), picking.join(name)]
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| PickerError::MicrographPathNotFound(name.to_string()))?;
            let id = model.core.next_id();
            model.core.add_micrograph(Micrograph::new(id, path));
        }

        log::info!(
            "Opened {} picking run {:?}: {} micrographs in {:?}",
            kind.suffix(),
            picking,
            model.core.len(),
            start.elapsed()
        );
        Ok(model)
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn kind(&self) -> PickKind {
        self.kind
    }

    /// Whether picks carry a figure of merit that can be thresholded.
    pub fn is_scored(&self) -> bool {
        self.kind == PickKind::Auto
    }

    pub fn score_threshold(&self) -> f64 {
        self.score_threshold
    }

    pub fn set_score_threshold(&mut self, threshold: f64) {
        self.score_threshold = threshold;
    }

    pub fn use_color(&self) -> bool {
        self.use_color
    }

    pub fn set_use_color(&mut self, use_color: bool) {
        self.use_color = use_color;
    }

    /// Coordinate file of a micrograph, which may not exist.
    pub fn coordinates_path(&self, mic: &Micrograph) -> PathBuf {
        self.run_dir
            .join(&self.layout.coordinates_dir)
            .join(format!("{}_{}.star", mic.stem(), self.kind.suffix()))
    }

    fn ensure_loaded(&mut self, id: MicrographId) -> Result<(), PickerError> {
        let mic = self.core.require(id)?;
        if mic.is_loaded() {
            return Ok(());
        }

        let path = self.coordinates_path(mic);
        let coordinates = if path.exists() {
            let start = Instant::now();
            let coordinates = read_star_coordinates(&path)?;
            log::debug!(
                "Loaded {} coordinates from {:?} in {:?}",
                coordinates.len(),
                path,
                start.elapsed()
            );
            coordinates
        } else {
            log::debug!("No coordinate file {:?}, micrograph {} has no picks", path, id);
            Vec::new()
        };

        let mic = self.core.require_mut(id)?;
        mic.extend(coordinates);
        mic.set_state(LoadState::Loaded);
        Ok(())
    }

    fn column(&self, col: usize) -> Option<Column> {
        let columns: &[Column] = if self.summary.is_some() {
            &[Column::Name, Column::Fom, Column::Coordinates, Column::Id]
        } else {
            &[Column::Name, Column::Coordinates, Column::Id]
        };
        columns.get(col).copied()
    }
}

/// Walk up from `start` to find the directory under which `micrograph` exists.
///
/// Falls back to two levels above `start`, the project root of a
/// `<Job>/jobNNN` directory.
fn find_image_prefix(micrograph: &str, start: &Path) -> Result<PathBuf, PickerError> {
    let start = std::path::absolute(start).map_err(FormatError::from)?;
    if let Some(root) = start.ancestors().find(|dir| dir.join(micrograph).exists()) {
        return Ok(root.to_path_buf());
    }
    let fallback = start.ancestors().nth(2).unwrap_or(&start).to_path_buf();
    log::warn!(
        "Micrograph {} not found above {:?}, assuming project root {:?}",
        micrograph,
        start,
        fallback
    );
    Ok(fallback)
}

/// Read the picks of one micrograph from a RELION coordinate STAR file.
///
/// Positions are rounded to pixels. Files without a figure of merit column
/// (manual picking) give picks a score of 0.
fn read_star_coordinates(path: &Path) -> Result<Vec<Coordinate>, FormatError> {
    let star = StarFile::read(path)?;
    let Some(table) = star.blocks().first() else {
        return Ok(Vec::new());
    };
    let has_fom = table.has_column(FIELD_FOM);

    table
        .rows()
        .map(|row| {
            let coord = Coordinate::from_f64(row.f64(FIELD_X)?, row.f64(FIELD_Y)?);
            let score = if has_fom { row.f64(FIELD_FOM)? } else { 0.0 };
            Ok(coord.with_score(score))
        })
        .collect()
}

impl PickerModel for RelionPickerModel {
    fn core(&self) -> &PickerCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut PickerCore {
        &mut self.core
    }

    fn create_coordinate(&self, x: i32, y: i32, label: Option<&str>) -> Coordinate {
        Coordinate::new(x, y)
            .with_label(label.unwrap_or(PASS_LABEL))
            .with_score(MANUAL_SCORE)
    }

    fn add_coordinates(
        &mut self,
        id: MicrographId,
        coordinates: Vec<Coordinate>,
    ) -> Result<(), PickerError> {
        // Load first, otherwise the file rows would be appended after these later
        self.ensure_loaded(id)?;
        self.core.add_coordinates(id, coordinates)
    }

    fn coordinates(&mut self, id: MicrographId) -> Result<&[Coordinate], PickerError> {
        self.ensure_loaded(id)?;
        Ok(self.core.require(id)?.coordinates())
    }

    fn iter_coordinates(&mut self, id: MicrographId) -> Result<CoordIter<'_>, PickerError> {
        let scored = self.is_scored();
        let threshold = self.score_threshold;
        let use_color = self.use_color;
        let coords = self.coordinates(id)?;

        Ok(Box::new(coords.iter().filter_map(move |c| {
            let mut coord = c.clone();
            if !scored {
                if coord.label.is_none() {
                    coord.set_label(PASS_LABEL);
                }
                return Some(coord);
            }
            let good = coord.score > threshold;
            coord.set_label(if good { PASS_LABEL } else { FAIL_LABEL });
            (good || use_color).then_some(coord)
        })))
    }

    fn params(&self) -> Form {
        let mut rows = Vec::new();
        if self.is_scored() {
            let threshold = Param::new(
                ParamId::ScoreThreshold,
                ParamKind::Float,
                ParamValue::Float(self.score_threshold),
            )
            .with_label("Score threshold")
            .with_help("Display coordinates with score above this value.")
            .slider(0.0, MAX_SCORE_THRESHOLD);
            let use_color = Param::new(
                ParamId::UseColor,
                ParamKind::Bool,
                ParamValue::Bool(self.use_color),
            )
            .with_label("Color coordinates by FOM?");
            rows.push(vec![threshold, use_color]);
        }
        rows.push(vec![
            Param::button(ParamId::PickAgain, "Pick Again"),
            Param::button(ParamId::Clear, "Clear coordinates"),
        ]);
        Form::new(rows)
    }

    fn apply_param(
        &mut self,
        id: MicrographId,
        param: ParamId,
        value: &ParamValue,
        values: &dyn Fn() -> ParamValues,
    ) -> Result<ChangeResult, PickerError> {
        match param {
            ParamId::ScoreThreshold if self.is_scored() => {
                self.score_threshold = resolve_f64(param, value, values)?;
                Ok(ChangeResult::changed())
            }
            ParamId::UseColor if self.is_scored() => {
                self.use_color = resolve_bool(param, value, values)?;
                Ok(ChangeResult::changed())
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
            ParamId::ScoreThreshold
            | ParamId::UseColor
            | ParamId::ShowBelow
            | ParamId::Sources
            | ParamId::Threshold => Ok(ChangeResult::unchanged()),
        }
    }

    fn columns(&self) -> Vec<ColumnConfig> {
        let mut columns = vec![ColumnConfig::new("Micrograph", DataType::String)];
        if self.summary.is_some() {
            columns.push(ColumnConfig::new("FOM", DataType::Float));
        }
        columns.push(ColumnConfig::new("Coordinates", DataType::Int));
        columns.push(ColumnConfig::new("Id", DataType::Int).hidden());
        columns
    }

    fn value(&mut self, row: usize, col: usize) -> Result<Value, PickerError> {
        let mic = self.core.require_row(row)?;
        let (id, loaded) = (mic.id(), mic.is_loaded());
        let summary = self.summary.as_ref().and_then(|s| s.get(row)).copied();

        match self.column(col) {
            Some(Column::Name) => Ok(Value::Str(mic.name())),
            Some(Column::Fom) => Ok(Value::Float(summary.map_or(0.0, |s| s.fom))),
            Some(Column::Coordinates) => match summary {
                // Real count once loaded, the summary count until then
                Some(entry) if !loaded => Ok(Value::Int(entry.particles)),
                _ => Ok(self.coordinates(id)?.len().into()),
            },
            Some(Column::Id) => Ok(Value::Int(i64::from(id.0))),
            None => Err(PickerError::InvalidColumn(col)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pick_kind_from_path() {
        assert_eq!(PickKind::from_picking_path(Path::new("AutoPick/job010")), PickKind::Auto);
        assert_eq!(PickKind::from_picking_path(Path::new("ManualPick/job004")), PickKind::Manual);
        assert_eq!(PickKind::Manual.suffix(), "manualpick");
    }

    #[test]
    fn test_read_star_coordinates_rounds_positions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("001_autopick.star");
        std::fs::write(
            &path,
            "data_\nloop_\n_rlnCoordinateX #1\n_rlnCoordinateY #2\n_rlnAutopickFigureOfMerit #3\n\
             100.4 200.6 1.5\n10.0 20.0 0.2\n",
        )
        .unwrap();

        let coords = read_star_coordinates(&path).unwrap();
        assert_eq!(coords.len(), 2);
        assert_eq!((coords[0].x, coords[0].y), (100, 201));
        assert_eq!(coords[0].score, 1.5);
        assert_eq!(coords[1].score, 0.2);
    }

    #[test]
    fn test_read_star_coordinates_without_fom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("001_manualpick.star");
        std::fs::write(&path, "data_\nloop_\n_rlnCoordinateX\n_rlnCoordinateY\n5 6\n").unwrap();

        let coords = read_star_coordinates(&path).unwrap();
        assert_eq!(coords.len(), 1);
        assert_eq!(coords[0].score, 0.0);
    }

    #[test]
    fn test_labels_and_alias() {
        let model =
            RelionPickerModel::empty(PathBuf::from("run"), RelionLayout::default(), PickKind::Auto);
        assert_eq!(model.labels().get("D").map(|l| l.color.as_str()), Some("#1EFF00"));
        assert_eq!(model.labels().get(FAIL_LABEL).map(|l| l.color.as_str()), Some("#DD0014"));
        assert_eq!(model.box_size(), 64);
    }

    #[test]
    fn test_find_image_prefix_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        let job = dir.path().join("AutoPick").join("job010");
        std::fs::create_dir_all(&job).unwrap();
        std::fs::create_dir_all(dir.path().join("Micrographs")).unwrap();
        std::fs::write(dir.path().join("Micrographs").join("001.mrc"), "").unwrap();

        let root = find_image_prefix("Micrographs/001.mrc", &job).unwrap();
        assert!(root.join("Micrographs/001.mrc").exists());

        // Unknown micrograph falls back to the project root
        let fallback = find_image_prefix("Other/002.mrc", &job).unwrap();
        assert_eq!(fallback, std::path::absolute(dir.path()).unwrap());
    }
}
