//! resample-bench - Main Entry Point

use clap::Parser;
use resample_bench::cli::{cmd_evaluate, cmd_info, Cli, Commands};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resample_bench=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Evaluate {
            data,
            outcome,
            nominal,
            folds,
            repeats,
            seed,
            config,
            corr_threshold,
            cost,
            sigma,
            output,
        } => {
            cmd_evaluate(
                &data,
                &outcome,
                &nominal,
                folds,
                repeats,
                seed,
                config.as_ref(),
                corr_threshold,
                cost,
                sigma,
                output.as_ref(),
            )?;
        }
        Commands::Info { data } => {
            cmd_info(&data)?;
        }
    }

    Ok(())
}
