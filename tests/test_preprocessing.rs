//! Integration test: recipes fit on training rows and replayed elsewhere

use polars::prelude::*;
use resample_bench::data::{ColumnKind, Dataset};
use resample_bench::preprocessing::{Recipe, Selector};
use resample_bench::resampling::Split;

fn housing_df() -> DataFrame {
    df!(
        "crim" => &[0.006, 0.027, 0.027, 0.032, 0.069, 0.030, 0.088, 0.145, 0.211, 0.170],
        "chas" => &[0i64, 0, 0, 1, 0, 0, 1, 0, 0, 1],
        "rm" => &[6.575, 6.421, 7.185, 6.998, 7.147, 6.430, 6.012, 6.172, 5.631, 6.004],
        "lstat" => &[4.98, 9.14, 4.03, 2.94, 5.33, 5.21, 12.43, 19.15, 29.93, 17.10],
        "medv" => &[24.0, 21.6, 34.7, 33.4, 36.2, 28.7, 22.9, 27.1, 16.5, 18.9],
    )
    .unwrap()
}

fn housing() -> Dataset {
    Dataset::from_dataframe(&housing_df()).unwrap()
}

fn housing_recipe() -> Recipe {
    Recipe::new("medv")
        .as_nominal(["chas"])
        .range_scale(Selector::AllNumericPredictors)
        .dummy(Selector::AllNominalPredictors)
}

#[test]
fn test_apply_is_idempotent_and_matches_direct_computation() {
    let data = housing();
    let split = Split::from_indices("Resample1", (0..7).collect(), (7..10).collect());
    let train = split.training(&data).unwrap();

    let fitted = housing_recipe().fit(&train).unwrap();
    let once = fitted.apply(&train).unwrap();
    let twice = fitted.apply(&train).unwrap();
    assert_eq!(once, twice);

    // Direct recomputation of the range step on the training rows
    let rm = train.column("rm").unwrap();
    let min = rm.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = rm.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    for (scaled, raw) in once.column("rm").unwrap().iter().zip(rm.iter()) {
        assert!((scaled - (raw - min) / (max - min)).abs() < 1e-12);
    }

    assert_eq!(once.column("chas_1").unwrap().to_vec(), vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0]);
    assert_eq!(once.kind("chas_1").unwrap(), ColumnKind::Numeric);
}

#[test]
fn test_no_leakage_from_test_rows() {
    let data = housing();
    let split = Split::from_indices("Resample1", (0..7).collect(), (7..10).collect());

    // Same training rows, wildly different test rows
    let mut values = data.values().clone();
    for row in 7..10 {
        for col in [0, 2, 3] {
            values[[row, col]] *= 100.0;
        }
    }
    let altered = Dataset::new(data.column_names().to_vec(), values, data.kinds().to_vec()).unwrap();

    let fitted = housing_recipe().fit(&split.training(&data).unwrap()).unwrap();
    let fitted_altered = housing_recipe().fit(&split.training(&altered).unwrap()).unwrap();
    assert_eq!(fitted, fitted_altered);

    let train_baked = fitted.apply(&split.training(&data).unwrap()).unwrap();
    let train_baked_altered = fitted_altered.apply(&split.training(&altered).unwrap()).unwrap();
    assert_eq!(train_baked, train_baked_altered);

    // Test rows are clipped with the frozen training range, not rescaled
    let test_baked = fitted_altered.apply(&split.testing(&altered).unwrap()).unwrap();
    assert!(test_baked.column("lstat").unwrap().iter().all(|&v| v == 1.0));
}

#[test]
fn test_correlation_filter_drops_one_of_pair() {
    // r(a, b) ≈ 0.90; |r| of every other predictor pair is below 0.4
    let data = Dataset::from_columns(vec![
        ("a", vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]),
        ("b", vec![2.2, 0.2, 3.6, 5.8, 3.8, 5.4, 8.8, 6.2, 9.6, 9.4]),
        ("c", vec![3.0, 7.0, 1.0, 9.0, 4.0, 8.0, 2.0, 10.0, 6.0, 5.0]),
        ("y", vec![5.0, 6.0, 4.0, 9.0, 7.0, 8.0, 6.0, 11.0, 9.0, 10.0]),
    ])
    .unwrap();

    let fitted = Recipe::new("y")
        .correlation_filter(Selector::AllNumericPredictors, 0.4)
        .fit(&data)
        .unwrap();

    let dropped = fitted.dropped_columns();
    assert_eq!(dropped.len(), 1);
    assert!(dropped[0] == "a" || dropped[0] == "b");
    assert!(fitted.output_columns().iter().any(|c| c == "y"));
    assert!(fitted.output_columns().iter().any(|c| c == "c"));

    // Kept columns pass through unchanged
    let out = fitted.apply(&data).unwrap();
    assert_eq!(out.column("c").unwrap(), data.column("c").unwrap());
    assert_eq!(out.column("y").unwrap(), data.column("y").unwrap());
}

#[test]
fn test_unseen_level_encodes_as_zero() {
    let data = housing();
    let mut values = data.values().clone();
    values[[8, 1]] = 2.0;
    let data = Dataset::new(data.column_names().to_vec(), values, data.kinds().to_vec()).unwrap();

    // Level 2 of chas only appears in the test row
    let split = Split::from_indices("Resample1", vec![0, 1, 2, 3, 4, 5, 6, 7, 9], vec![8]);
    let fitted = housing_recipe().fit(&split.training(&data).unwrap()).unwrap();
    assert!(!fitted.output_columns().iter().any(|c| c == "chas_2"));

    let test_baked = fitted.apply(&split.testing(&data).unwrap()).unwrap();
    assert_eq!(test_baked.column("chas_1").unwrap().to_vec(), vec![0.0]);
}

#[test]
fn test_missing_input_column() {
    let data = housing();
    let fitted = housing_recipe().fit(&data).unwrap();
    let without = data.drop_columns(&["lstat"]);
    assert!(fitted.apply(&without).is_err());
}

#[test]
fn test_indicator_name_clash_is_schema_error() {
    let data = Dataset::from_columns(vec![
        ("chas", vec![0.0, 1.0, 0.0, 1.0]),
        ("chas_1", vec![0.3, 0.1, 0.4, 0.1]),
        ("y", vec![1.0, 2.0, 3.0, 4.0]),
    ])
    .unwrap();

    let err = Recipe::new("y")
        .as_nominal(["chas"])
        .dummy(Selector::AllNominalPredictors)
        .fit(&data)
        .unwrap_err();
    assert_eq!(err.kind(), resample_bench::error::ErrorKind::Schema);
}
