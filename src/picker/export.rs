//! Writing the picks of a model back to disk.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::format::{write_coordinates, FormatError, StarFile, StarTable};
use crate::model::{Coordinate, MicrographId};
use crate::picker::traits::PickerModel;
use crate::picker::PickerError;

/// Output format of [`export_picks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// `<stem>.txt` in the whitespace coordinate layout
    #[default]
    Text,
    /// `<stem>_manualpick.star`, readable as a manual picking run
    Star,
}

impl ExportFormat {
    /// Output file name for a micrograph stem.
    pub fn file_name(&self, stem: &str) -> String {
        match self {
            ExportFormat::Text => format!("{stem}.txt"),
            ExportFormat::Star => format!("{stem}_manualpick.star"),
        }
    }
}

/// Result of an export operation.
#[derive(Debug, Default)]
pub struct ExportResult {
    /// Number of micrographs written.
    pub micrographs_exported: usize,

    /// Number of picks written.
    pub coordinates_exported: usize,

    /// Warnings generated during export (e.g., dropped segment ends).
    pub warnings: Vec<FormatWarning>,

    /// Files created during export.
    pub files_created: Vec<PathBuf>,
}

impl ExportResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warning(&mut self, warning: FormatWarning) {
        self.warnings.push(warning);
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Whether any micrograph failed to export.
    pub fn has_errors(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| matches!(w.severity, WarningSeverity::Error))
    }
}

/// Warning generated while writing picks.
#[derive(Debug, Clone)]
pub struct FormatWarning {
    /// Micrograph the warning relates to (if applicable).
    pub micrograph: Option<PathBuf>,

    /// Human-readable warning message.
    pub message: String,

    pub severity: WarningSeverity,
}

impl FormatWarning {
    pub fn new(message: impl Into<String>, severity: WarningSeverity) -> Self {
        Self {
            micrograph: None,
            message: message.into(),
            severity,
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(message, WarningSeverity::Warning)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(message, WarningSeverity::Error)
    }

    /// Set the micrograph this warning relates to.
    pub fn with_micrograph(mut self, path: impl Into<PathBuf>) -> Self {
        self.micrograph = Some(path.into());
        self
    }
}

/// Severity level for export warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    /// Something was skipped or modified.
    Warning,
    /// The picks of a micrograph were not written.
    Error,
}

/// Write the displayed picks of every micrograph into `dir`, one file per
/// micrograph.
///
/// The picks written are those [`PickerModel::iter_coordinates`] yields, so
/// the current filters apply. Micrographs without picks still get a file.
/// A micrograph that fails to load or write is reported as an
/// [`WarningSeverity::Error`] warning and the export goes on with the next.
pub fn export_picks(
    model: &mut dyn PickerModel,
    dir: &Path,
    format: ExportFormat,
) -> Result<ExportResult, PickerError> {
    std::fs::create_dir_all(dir).map_err(FormatError::from)?;
    let mut result = ExportResult::new();

    let rows = model.rows_count();
    for row in 0..rows {
        let mic = model
            .micrograph_by_index(row)
            .ok_or(PickerError::InvalidRow { row, rows })?;
        let (id, stem, mic_path) = (mic.id(), mic.stem(), mic.path().to_path_buf());
        let path = dir.join(format.file_name(&stem));

        let coordinates = match export_micrograph(model, id, &path, format) {
            Ok(coordinates) => coordinates,
            Err(err) => {
                log::warn!("Picks of {:?} not exported: {}", mic_path, err);
                result.add_warning(
                    FormatWarning::error(format!("picks not exported: {err}"))
                        .with_micrograph(&mic_path),
                );
                continue;
            }
        };

        let segments = coordinates.iter().filter(|c| c.is_segment()).count();
        if format == ExportFormat::Star && segments > 0 {
            result.add_warning(
                FormatWarning::warning(format!(
                    "{} segment end points not written to {}",
                    segments,
                    path.display()
                ))
                .with_micrograph(&mic_path),
            );
        }

        log::debug!("Wrote {} picks to {:?}", coordinates.len(), path);
        result.micrographs_exported += 1;
        result.coordinates_exported += coordinates.len();
        result.files_created.push(path);
    }

    log::info!(
        "Exported {} picks of {} micrographs to {:?}",
        result.coordinates_exported,
        result.micrographs_exported,
        dir
    );
    Ok(result)
}

/// Write the displayed picks of one micrograph and return them.
fn export_micrograph(
    model: &mut dyn PickerModel,
    id: MicrographId,
    path: &Path,
    format: ExportFormat,
) -> Result<Vec<Coordinate>, PickerError> {
    let coordinates: Vec<Coordinate> = model.iter_coordinates(id)?.collect();
    match format {
        ExportFormat::Text => write_coordinates(path, &coordinates)?,
        ExportFormat::Star => write_star_coordinates(path, &coordinates)?,
    }
    Ok(coordinates)
}

fn write_star_coordinates(path: &Path, coordinates: &[Coordinate]) -> Result<(), FormatError> {
    let mut table = StarTable::new(
        "",
        &["rlnCoordinateX", "rlnCoordinateY", "rlnAutopickFigureOfMerit"],
    );
    for coord in coordinates {
        table.push_row(vec![
            coord.x.to_string(),
            coord.y.to_string(),
            format!("{:.6}", coord.score),
        ])?;
    }
    StarFile::write(path, &[&table])
}
