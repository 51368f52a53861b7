//! Integration test: evaluation pipeline end-to-end

use resample_bench::prelude::*;
use resample_bench::preprocessing::Selector;
use std::io::Write;

fn line_data() -> Dataset {
    Dataset::from_columns(vec![
        ("x", (1..=10).map(|v| v as f64).collect()),
        ("y", vec![2.1, 3.9, 6.2, 7.8, 10.1, 12.2, 13.8, 16.1, 18.0, 19.9]),
    ])
    .unwrap()
}

fn wide_data(n: usize) -> Dataset {
    let x1: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let x2: Vec<f64> = (0..n).map(|i| ((i * 7) % 11) as f64).collect();
    let k: Vec<f64> = vec![3.0; n];
    let y: Vec<f64> = (0..n)
        .map(|i| 2.0 * x1[i] - x2[i] + (i as f64).sin())
        .collect();
    Dataset::from_columns(vec![("x1", x1), ("x2", x2), ("k", k), ("y", y)]).unwrap()
}

#[test]
fn test_fixed_split_linear_mse() {
    let data = line_data();
    let split = Split::from_indices("Resample1", (0..7).collect(), (7..10).collect());
    let recipe = Recipe::new("y");
    let model = ModelSpec::linear_reg();
    let unit = EvalUnit::new(&split, &recipe, &model, "lm");

    let config = EvalConfig::default().with_metrics([Metric::Mse, Metric::Rmse]);
    let result = Evaluator::new(config).unwrap().evaluate_unit(&data, &unit).unwrap();

    let mse = result.metrics[0].estimate;
    assert_eq!(result.metrics[0].metric, Metric::Mse);
    assert!((mse - 0.4 / 49.0).abs() < 1e-6, "mse = {}", mse);
    assert!((result.metrics[1].estimate - mse.sqrt()).abs() < 1e-12);
}

#[test]
fn test_last_fit_coefficients() {
    let data = line_data();
    let split = Split::from_indices("Resample1", (0..7).collect(), (7..10).collect());
    let fit = Evaluator::default()
        .last_fit(&data, &split, &Recipe::new("y"), &ModelSpec::linear_reg(), "lm")
        .unwrap();

    let (intercept, slopes) = fit.model.coefficients().unwrap();
    assert!((intercept - 0.5 / 7.0).abs() < 1e-9);
    assert!((slopes[0] - 13.9 / 7.0).abs() < 1e-9);
    assert_eq!(fit.predictions.rows, vec![7, 8, 9]);
}

#[test]
fn test_same_seed_gives_identical_report() {
    let data = wide_data(40);
    let recipe = Recipe::new("y")
        .zero_variance(Selector::AllPredictors)
        .range_scale(Selector::AllNumericPredictors);
    let lm = ModelSpec::linear_reg();
    let svm = ModelSpec::svm_rbf(1.0, 0.5);

    let run = |parallel: bool| {
        let config = EvalConfig::default()
            .with_seed(42)
            .with_parallel(parallel)
            .with_save_predictions(true);
        let splits = CrossValidator::k_fold(5)
            .with_random_state(config.seed)
            .split(data.n_rows())
            .unwrap();
        let mut units = resample_units(&splits, &recipe, &lm, "lm");
        units.extend(resample_units(&splits, &recipe, &svm, "svm"));
        Evaluator::new(config).unwrap().run(&data, &units).to_json().unwrap()
    };

    let first = run(false);
    let second = run(false);
    assert_eq!(first, second);

    // Parallel mapping keeps unit order and values
    assert_eq!(first, run(true));
}

#[test]
fn test_dropped_column_fails_only_that_unit() {
    let data = wide_data(20);
    let splits = CrossValidator::k_fold(4).with_random_state(1).split(data.n_rows()).unwrap();
    let recipe = Recipe::new("y").zero_variance(Selector::AllPredictors);
    let model = ModelSpec::linear_reg();
    let uses_dropped = Formula::new("y", ["x1", "k"]);

    let units = vec![
        EvalUnit::new(&splits[0], &recipe, &model, "with_k").with_formula(&uses_dropped),
        EvalUnit::new(&splits[0], &recipe, &model, "default"),
        EvalUnit::new(&splits[1], &recipe, &model, "default"),
    ];
    let report = Evaluator::new(EvalConfig::default()).unwrap().run(&data, &units);

    assert_eq!(report.failures.len(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.label, "with_k");
    assert_eq!(failure.fold_id, splits[0].id());
    assert_eq!(failure.kind, ErrorKind::Schema);
    assert!(failure.message.contains("'k'"));

    assert_eq!(report.metrics.len(), 6);
    assert!(report.metrics.iter().all(|r| r.label == "default"));
}

#[test]
fn test_singular_design_is_fit_failure() {
    let x: Vec<f64> = (0..24).map(|i| i as f64).collect();
    let data = Dataset::from_columns(vec![
        ("x", x.clone()),
        ("x_twice", x.iter().map(|v| 2.0 * v).collect()),
        ("y", x.iter().map(|v| 0.5 * v + (v * 1.3).cos()).collect()),
    ])
    .unwrap();

    let splits = CrossValidator::k_fold(3).with_random_state(5).split(data.n_rows()).unwrap();
    let recipe = Recipe::new("y");
    let lm = ModelSpec::linear_reg();
    let svm = ModelSpec::svm_rbf(1.0, 0.01);
    let mut units = resample_units(&splits, &recipe, &lm, "lm");
    units.extend(resample_units(&splits, &recipe, &svm, "svm"));

    let report = Evaluator::new(EvalConfig::default()).unwrap().run(&data, &units);

    assert_eq!(report.failures.len(), 3);
    assert!(report.failures.iter().all(|f| f.label == "lm" && f.kind == ErrorKind::Fit));
    assert_eq!(report.metrics_for("svm").count(), 9);

    let summary = report.summarize();
    assert!(summary.iter().all(|s| s.label == "svm" && s.n == 3));
}

#[test]
fn test_csv_to_summary() {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    writeln!(file, "x,chas,y").unwrap();
    for i in 0..30 {
        let chas = i % 3 == 0;
        let y = 1.5 * i as f64 + if chas { 4.0 } else { 0.0 } + ((i * 5) % 7) as f64 * 0.1;
        writeln!(file, "{},{},{}", i, chas as i32, y).unwrap();
    }
    file.flush().unwrap();

    let data = DataLoader::new().load_csv(file.path()).unwrap();
    assert_eq!(data.n_rows(), 30);

    let splits = CrossValidator::k_fold(5).with_random_state(42).split(data.n_rows()).unwrap();
    let recipe = Recipe::new("y")
        .as_nominal(["chas"])
        .range_scale(Selector::AllNumericPredictors)
        .correlation_filter(Selector::AllNumericPredictors, 0.9)
        .dummy(Selector::AllNominalPredictors);
    let model = ModelSpec::linear_reg();
    let units = resample_units(&splits, &recipe, &model, "lm");

    let report = Evaluator::new(EvalConfig::default()).unwrap().run(&data, &units);
    assert!(report.is_complete());

    let summary = report.summarize();
    let names: Vec<&str> = summary.iter().map(|s| s.metric.name()).collect();
    assert_eq!(names, vec!["mae", "rmse", "rsq"]);
    let rsq = summary.iter().find(|s| s.metric == Metric::Rsq).unwrap();
    assert!(rsq.mean > 0.95);

    let frame = report.metrics_frame().unwrap();
    assert_eq!(frame.height(), 15);
}

#[test]
fn test_empty_metric_set_is_rejected() {
    let config = EvalConfig::default().with_metrics([]);
    assert!(config.validate().is_err());
    assert!(Evaluator::new(config).is_err());
}

#[test]
fn test_constant_outcome_report_reloads() {
    let data = Dataset::from_columns(vec![
        ("x", (1..=10).map(|v| v as f64).collect()),
        ("y", vec![3.0; 10]),
    ])
    .unwrap();
    let split = Split::from_indices("Resample1", (0..7).collect(), (7..10).collect());
    let recipe = Recipe::new("y");
    let model = ModelSpec::linear_reg();
    let units = vec![EvalUnit::new(&split, &recipe, &model, "lm")];

    let report = Evaluator::new(EvalConfig::default()).unwrap().run(&data, &units);
    let rsq = report.metrics.iter().find(|r| r.metric == Metric::Rsq).unwrap();
    assert!(rsq.estimate.is_nan());

    let json = report.to_json().unwrap();
    let back = EvalReport::from_json(&json).unwrap();
    assert_eq!(back.metrics.len(), report.metrics.len());
    assert_eq!(back.to_json().unwrap(), json);
}
