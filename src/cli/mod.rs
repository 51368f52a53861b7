//! Command-line driver
//!
//! Loads a CSV, builds k-fold resamples, and evaluates a linear model and an
//! RBF support vector regression under the same preprocessing recipe.

use clap::{Parser, Subcommand};
use colored::*;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use crate::data::{ColumnKind, DataLoader, Dataset};
use crate::evaluation::{resample_units, EvalConfig, EvalReport, Evaluator};
use crate::preprocessing::{Recipe, Selector};
use crate::resampling::{CVStrategy, CrossValidator};
use crate::training::ModelSpec;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    let _ = write_step(&mut std::io::stdout().lock(), msg);
}

/// The prefix has no newline, so it is flushed before the step starts
fn write_step<W: Write>(out: &mut W, msg: &str) -> std::io::Result<()> {
    write!(out, "  {} {}... ", accent("›"), msg)?;
    out.flush()
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "resample-bench")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Resampled evaluation of regression models on tabular data")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Cross-validate linear regression and RBF SVR on a CSV file
    Evaluate {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,

        /// Outcome column name
        #[arg(short, long)]
        outcome: String,

        /// Columns to treat as nominal (dummy-encoded)
        #[arg(long)]
        nominal: Vec<String>,

        /// Number of cross-validation folds
        #[arg(long, default_value = "10")]
        folds: usize,

        /// Number of repeats of the k-fold partition
        #[arg(long, default_value = "1")]
        repeats: usize,

        /// Resampling seed (overrides the config file)
        #[arg(long)]
        seed: Option<u64>,

        /// Evaluation config (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Absolute correlation above which a predictor is filtered out
        #[arg(long, default_value = "0.9")]
        corr_threshold: f64,

        /// SVR cost
        #[arg(long, default_value = "1.0")]
        cost: f64,

        /// SVR RBF kernel width
        #[arg(long, default_value = "1.0")]
        sigma: f64,

        /// Write the full report as JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show the columns of a CSV file as the evaluator sees them
    Info {
        /// Input CSV file
        #[arg(short, long)]
        data: PathBuf,
    },
}

// ─── Commands ──────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn cmd_evaluate(
    data_path: &PathBuf,
    outcome: &str,
    nominal: &[String],
    folds: usize,
    repeats: usize,
    seed: Option<u64>,
    config_path: Option<&PathBuf>,
    corr_threshold: f64,
    cost: f64,
    sigma: f64,
    output: Option<&PathBuf>,
) -> anyhow::Result<()> {
    section("Evaluate");

    let mut config = match config_path {
        Some(path) => EvalConfig::from_file(path)?,
        None => EvalConfig::default(),
    };
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }

    step_run("Loading data");
    let data = DataLoader::new().load_csv(data_path)?;
    step_done(&format!("{} rows × {} cols", data.n_rows(), data.n_cols()));

    if !data.has_column(outcome) {
        anyhow::bail!("outcome column '{}' not found in {}", outcome, data_path.display());
    }

    let strategy = if repeats > 1 {
        CVStrategy::RepeatedKFold { n_splits: folds, n_repeats: repeats }
    } else {
        CVStrategy::KFold { n_splits: folds, shuffle: true }
    };
    let splits = CrossValidator::new(strategy)
        .with_random_state(config.seed)
        .split(data.n_rows())?;

    let recipe = Recipe::new(outcome)
        .as_nominal(nominal.iter().cloned())
        .range_scale(Selector::AllNumericPredictors)
        .correlation_filter(Selector::AllNumericPredictors, corr_threshold)
        .dummy(Selector::AllNominalPredictors);

    let lm = ModelSpec::linear_reg();
    let svm = ModelSpec::svm_rbf(cost, sigma);

    let mut units = resample_units(&splits, &recipe, &lm, "lm");
    units.extend(resample_units(&splits, &recipe, &svm, "svm"));

    step_run(&format!("Evaluating {} units over {} resamples", units.len(), splits.len()));
    let start = Instant::now();
    let report = Evaluator::new(config)?.run(&data, &units);
    step_done(&format!("{:.2?}", start.elapsed()));

    print_summary(&report);

    if let Some(path) = output {
        std::fs::write(path, report.to_json()?)?;
        println!();
        println!("  {} {}", muted("report written to"), path.display());
    }

    Ok(())
}

pub fn cmd_info(data_path: &PathBuf) -> anyhow::Result<()> {
    section("Dataset");

    let data = DataLoader::new().load_csv(data_path)?;
    println!("  {} {}", muted("rows"), data.n_rows());
    println!("  {} {}", muted("cols"), data.n_cols());
    println!();
    print_columns(&data);

    Ok(())
}

fn print_columns(data: &Dataset) {
    println!("  {:<20} {:>8} {:>12} {:>12}", muted("Column"), muted("Kind"), muted("Min"), muted("Max"));
    println!("  {}", dim(&"─".repeat(56)));
    for (idx, name) in data.column_names().iter().enumerate() {
        let col = data.values().column(idx);
        let min = col.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = col.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let kind = match data.kinds()[idx] {
            ColumnKind::Numeric => "numeric",
            ColumnKind::Nominal => "nominal",
        };
        println!("  {:<20} {:>8} {:>12.4} {:>12.4}", name, kind, min, max);
    }
}

fn print_summary(report: &EvalReport) {
    println!();
    println!(
        "  {:<10} {:<10} {:>4} {:>12} {:>12}",
        muted("Label"),
        muted("Metric"),
        muted("n"),
        muted("Mean"),
        muted("Std err")
    );
    println!("  {}", dim(&"─".repeat(52)));

    for s in report.summarize() {
        println!(
            "  {:<10} {:<10} {:>4} {:>12.4} {:>12.4}",
            s.label,
            s.metric.name(),
            s.n,
            s.mean,
            s.std_err
        );
    }

    if !report.failures.is_empty() {
        println!();
        println!("  {}", format!("{} failed units", report.failures.len()).red());
        for f in &report.failures {
            println!("  {:<10} {:<14} {:<8} {}", f.label, f.fold_id, f.kind.to_string(), dim(&f.message));
        }
    }
}
