//! Exporting picks and reading them back.

use super::fixtures::{memory_model, no_values, JobDir};
use std::fs;

use crate::format::{discover_sources, StarFile, Strictness};
use crate::model::MicrographId;
use crate::picker::{
    export_picks, ExportFormat, ParamValue, PickShape, PickerModel, RandomPickerModel,
    RelionLayout, RelionPickerModel, SimplePickerModel, WarningSeverity,
};

#[test]
fn test_text_export_reads_back() {
    let out = tempfile::tempdir().unwrap();
    let mut model = memory_model(&[3, 0, 2]);
    let result = export_picks(&mut model, out.path(), ExportFormat::Text).unwrap();

    assert_eq!(result.micrographs_exported, 3);
    assert_eq!(result.coordinates_exported, 5);
    assert_eq!(result.files_created.len(), 3);
    assert!(!result.has_warnings());
    assert!(out.path().join("mic_001.txt").exists());

    // Pair the written files with stand-in micrographs and load them again
    for i in 1..=3 {
        std::fs::write(out.path().join(format!("mic_{i:03}.mrc")), "").unwrap();
    }
    let mics = out.path().join("*.mrc");
    let coords = out.path().join("*.txt");
    let sources = discover_sources(mics.to_str().unwrap(), coords.to_str()).unwrap();
    let mut reread = SimplePickerModel::from_sources(sources, Strictness::Strict);

    assert_eq!(reread.rows_count(), 3);
    for (row, expected) in [3, 0, 2].into_iter().enumerate() {
        let id = reread.micrograph_by_index(row).unwrap().id();
        let original = model.coordinates(id).unwrap().to_vec();
        let loaded = reread.coordinates(id).unwrap();
        assert_eq!(loaded.len(), expected);
        for (a, b) in original.iter().zip(loaded) {
            assert_eq!((a.x, a.y), (b.x, b.y));
        }
    }
}

#[test]
fn test_failed_micrograph_is_reported_and_skipped() {
    let input = tempfile::tempdir().unwrap();
    for stem in ["a", "b", "c"] {
        fs::write(input.path().join(format!("{stem}.mrc")), "").unwrap();
    }
    fs::write(input.path().join("a.txt"), "10 20\n30 40\n").unwrap();
    fs::write(input.path().join("b.txt"), "10 20\nnot a pick\n").unwrap();
    fs::write(input.path().join("c.txt"), "5 5\n").unwrap();

    let mics = input.path().join("*.mrc");
    let coords = input.path().join("*.txt");
    let sources = discover_sources(mics.to_str().unwrap(), coords.to_str()).unwrap();
    let mut model = SimplePickerModel::from_sources(sources, Strictness::Strict);

    let out = tempfile::tempdir().unwrap();
    let result = export_picks(&mut model, out.path(), ExportFormat::Text).unwrap();

    assert_eq!(result.micrographs_exported, 2);
    assert_eq!(result.coordinates_exported, 3);
    assert!(result.has_errors());
    assert_eq!(result.warnings.len(), 1);
    let warning = &result.warnings[0];
    assert_eq!(warning.severity, WarningSeverity::Error);
    assert!(warning.micrograph.as_ref().unwrap().ends_with("b.mrc"));

    assert!(out.path().join("a.txt").exists());
    assert!(!out.path().join("b.txt").exists());
    assert!(out.path().join("c.txt").exists());
}

#[test]
fn test_star_export_applies_current_filters() {
    let job = JobDir::new(&[("001", 0.9, 3)]);
    job.write_picks("001", &[(10.0, 10.0, 0.9), (20.0, 20.0, 0.1), (30.0, 30.0, 2.5)]);
    let mut model = RelionPickerModel::open(&job.job, RelionLayout::default()).unwrap();
    model
        .change_param(MicrographId(1), "scoreThreshold", &ParamValue::Float(0.5), &no_values)
        .unwrap();

    let out = tempfile::tempdir().unwrap();
    let result = export_picks(&mut model, out.path(), ExportFormat::Star).unwrap();
    assert_eq!(result.coordinates_exported, 2);

    let star = StarFile::read(&out.path().join("001_manualpick.star")).unwrap();
    let table = star.first().unwrap();
    assert_eq!(table.len(), 2);
    let xs: Vec<f64> = table.rows().map(|r| r.f64("rlnCoordinateX").unwrap()).collect();
    assert_eq!(xs, vec![10.0, 30.0]);
}

#[test]
fn test_star_export_warns_about_segments() {
    let mut model = RandomPickerModel::new(2, 5, PickShape::Segment, (256, 256), 3);
    let out = tempfile::tempdir().unwrap();
    let result = export_picks(&mut model, out.path(), ExportFormat::Star).unwrap();

    assert_eq!(result.warnings.len(), 2);
    assert!(result.warnings.iter().all(|w| w.severity == WarningSeverity::Warning));
    assert!(!result.has_errors());

    // Text keeps both end points
    let text = export_picks(&mut model, out.path(), ExportFormat::Text).unwrap();
    assert!(!text.has_warnings());
    let content = std::fs::read_to_string(out.path().join("synthetic_001.txt")).unwrap();
    assert!(content.lines().all(|l| l.split_whitespace().count() == 5));
}
