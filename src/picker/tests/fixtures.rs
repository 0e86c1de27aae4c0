//! Run directories and in-memory models shared by the scenario tests.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::model::{Coordinate, Micrograph, MicrographId};
use crate::picker::{ParamValues, PickerModel, SimplePickerModel};

/// A picking job laid out like RELION does it:
///
/// ```text
/// <root>/Micrographs/<stem>.mrc
/// <root>/AutoPick/job010/{note.txt, summary.star}
/// <root>/AutoPick/job010/Movies/<stem>_autopick.star
/// ```
pub struct JobDir {
    pub root: TempDir,
    pub job: PathBuf,
}

impl JobDir {
    /// `summary` holds `(stem, fom, particles)` per micrograph.
    pub fn new(summary: &[(&str, f64, i64)]) -> Self {
        let root = tempfile::tempdir().unwrap();
        let job = root.path().join("AutoPick").join("job010");
        fs::create_dir_all(job.join("Movies")).unwrap();
        fs::create_dir_all(root.path().join("Micrographs")).unwrap();
        fs::write(job.join("note.txt"), "++++ Executing new job on Mon Jan 1\n").unwrap();

        let mut star = String::from(
            "\ndata_\n\nloop_\n_rlnMicrographName #1\n_rlnAutopickFigureOfMerit #2\n_rlnGroupNrParticles #3\n",
        );
        for (stem, fom, particles) in summary {
            fs::write(root.path().join("Micrographs").join(format!("{stem}.mrc")), "").unwrap();
            star.push_str(&format!("Micrographs/{stem}.mrc {fom} {particles}\n"));
        }
        fs::write(job.join("summary.star"), star).unwrap();

        Self { root, job }
    }

    pub fn coordinates_path(&self, stem: &str) -> PathBuf {
        self.job.join("Movies").join(format!("{stem}_autopick.star"))
    }

    /// Write the autopick file of a micrograph, `(x, y, fom)` per pick.
    pub fn write_picks(&self, stem: &str, picks: &[(f64, f64, f64)]) {
        write_autopick(&self.coordinates_path(stem), picks);
    }
}

pub fn write_autopick(path: &Path, picks: &[(f64, f64, f64)]) {
    let mut star = String::from(
        "\ndata_\n\nloop_\n_rlnCoordinateX #1\n_rlnCoordinateY #2\n_rlnAutopickFigureOfMerit #3\n",
    );
    for (x, y, fom) in picks {
        star.push_str(&format!("{x:.6} {y:.6} {fom:.6}\n"));
    }
    fs::write(path, star).unwrap();
}

/// In-memory model with one micrograph per entry of `counts`.
///
/// Pick `k` of micrograph `i` sits at `(200 k, 10 i)` with score `k / 10`.
pub fn memory_model(counts: &[usize]) -> SimplePickerModel {
    let mut model = SimplePickerModel::new();
    for (i, &count) in counts.iter().enumerate() {
        let coords = (0..count)
            .map(|k| Coordinate::new(k as i32 * 200, i as i32 * 10).with_score(k as f64 / 10.0))
            .collect();
        let id = MicrographId(i as u32 + 1);
        model
            .add_micrograph(Micrograph::with_coordinates(
                id,
                format!("mic_{:03}.mrc", i + 1),
                coords,
            ))
            .unwrap();
    }
    model
}

/// Value snapshot callback for parameter changes that carry their value.
pub fn no_values() -> ParamValues {
    ParamValues::new()
}
