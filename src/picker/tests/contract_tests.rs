//! Behaviour every picker model shares through the `PickerModel` contract.

use super::fixtures::{memory_model, no_values, JobDir};
use crate::model::{Coordinate, MicrographId};
use crate::picker::{
    ChangeResult, MicrographMatching, ParamValue, PickShape, PickerCmpModel, PickerModel,
    RandomPickerModel, RelionLayout, RelionPickerModel,
};

fn all_models(job: &JobDir) -> Vec<Box<dyn PickerModel>> {
    let relion = RelionPickerModel::open(&job.job, RelionLayout::default()).unwrap();
    vec![
        Box::new(memory_model(&[3, 1])),
        Box::new(RandomPickerModel::new(2, 10, PickShape::Point, (512, 512), 7)),
        Box::new(relion),
        Box::new(PickerCmpModel::new(
            Box::new(memory_model(&[2, 2])),
            Box::new(memory_model(&[1])),
            MicrographMatching::Index,
        )),
    ]
}

fn sample_job() -> JobDir {
    let job = JobDir::new(&[("001", 0.9, 2), ("002", 0.3, 0)]);
    job.write_picks("001", &[(10.0, 10.0, 0.9), (20.0, 20.0, 0.1)]);
    job
}

fn snapshot(model: &mut dyn PickerModel) -> Vec<Vec<Coordinate>> {
    (0..model.rows_count())
        .map(|row| {
            let id = model.micrograph_by_index(row).unwrap().id();
            model.iter_coordinates(id).unwrap().collect()
        })
        .collect()
}

#[test]
fn test_unknown_parameter_is_a_no_op() {
    let job = sample_job();
    for mut model in all_models(&job) {
        let before = snapshot(model.as_mut());
        let params_before = model.params();

        for name in ["bogus", "Clear", "score_threshold", ""] {
            let result = model
                .change_param(MicrographId(1), name, &ParamValue::Bool(true), &no_values)
                .unwrap();
            assert_eq!(result, ChangeResult::unchanged(), "parameter '{name}'");
        }

        assert_eq!(snapshot(model.as_mut()), before);
        assert_eq!(model.params(), params_before);
    }
}

#[test]
fn test_iteration_is_restartable() {
    let job = sample_job();
    for mut model in all_models(&job) {
        let first = snapshot(model.as_mut());
        let second = snapshot(model.as_mut());
        assert_eq!(first, second);
    }
}

#[test]
fn test_unknown_micrograph_is_an_error() {
    let job = sample_job();
    for mut model in all_models(&job) {
        let missing = MicrographId(999);
        assert!(model.micrograph(missing).is_none());
        assert!(model.iter_coordinates(missing).is_err());
        assert!(model.micrograph_by_index(model.rows_count()).is_none());
    }
}

#[test]
fn test_columns_start_with_micrograph_name() {
    let job = sample_job();
    for mut model in all_models(&job) {
        let columns = model.columns();
        assert_eq!(columns[0].name, "Micrograph");
        let name = model.value(0, 0).unwrap();
        let expected = model.micrograph_by_index(0).unwrap().name();
        assert_eq!(name.as_str(), Some(expected.as_str()));
        assert!(model.value(0, columns.len()).is_err());
    }
}

#[test]
fn test_params_describe_known_ids() {
    let job = sample_job();
    for model in all_models(&job) {
        let form = model.params();
        assert!(!form.is_empty());
        for param in form.params() {
            assert_eq!(crate::picker::ParamId::from_name(param.name()), Some(param.id));
        }
    }
}
