//! tabtext - Main Entry Point
//!
//! Schema inspection and train/test preparation for tabular and text datasets.

use clap::Parser;
use tabtext::cli::{cmd_prepare, cmd_schema, Cli, Commands, PrepareArgs};

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tabtext=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Schema { data, load } => {
            cmd_schema(&data, &load)?;
        }
        Commands::Prepare {
            data,
            load,
            config,
            target,
            task,
            split,
            class_weight,
            text_col,
            vocab_size,
            exclude,
            seed,
            fit_scope,
            output,
        } => {
            let args = PrepareArgs {
                config,
                target,
                task,
                split,
                class_weight,
                text_col,
                vocab_size,
                exclude,
                seed,
                fit_scope,
            };
            cmd_prepare(&data, &load, &args, output.as_deref())?;
        }
    }

    Ok(())
}
