// dqd/src/main.rs

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Setup Logging (Tracing)
    // RUST_LOG=debug dqd run ... pour voir les détails
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            project_dir,
            max_workers,
            exclude,
            output,
        } => {
            commands::run::execute(commands::run::RunOptions {
                project_dir,
                max_workers: max_workers.map(usize::from),
                exclude,
                output,
            })
            .await
        }
        Commands::Plan {
            project_dir,
            exclude,
        } => commands::plan::execute(project_dir, exclude),
    }
}
