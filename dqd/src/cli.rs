// dqd/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "dqd")]
#[command(about = "Data quality checks for OMOP CDM datasets", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🩺 Runs every check of the catalogue and writes the JSON report
    Run {
        /// Project directory (holds dqd.yaml)
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Concurrent check queries per check (1-256)
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..=256))]
        max_workers: Option<u16>,

        /// Extra tables to exclude from every check (repeatable, comma separated)
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,

        /// Report directory (defaults to the project's output-path)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// 📝 Expands the catalogue and shows the instances each check would run
    Plan {
        /// Project directory (holds dqd.yaml)
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Extra tables to exclude from every check (repeatable, comma separated)
        #[arg(long, value_delimiter = ',')]
        exclude: Vec<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, bail};
    use clap::Parser;

    #[test]
    fn test_cli_parse_run_defaults() -> Result<()> {
        let args = Cli::parse_from(["dqd", "run"]);
        match args.command {
            Commands::Run {
                project_dir,
                max_workers,
                exclude,
                output,
            } => {
                assert_eq!(project_dir.to_string_lossy(), ".");
                assert_eq!(max_workers, None);
                assert!(exclude.is_empty());
                assert_eq!(output, None);
                Ok(())
            }
            _ => bail!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_parse_run_overrides() -> Result<()> {
        let args = Cli::parse_from([
            "dqd",
            "run",
            "--project-dir",
            "/tmp/synthea",
            "--max-workers",
            "4",
            "--exclude",
            "NOTE,NOTE_NLP",
            "--exclude",
            "SPECIMEN",
            "-o",
            "/tmp/reports",
        ]);
        match args.command {
            Commands::Run {
                project_dir,
                max_workers,
                exclude,
                output,
            } => {
                assert_eq!(project_dir.to_string_lossy(), "/tmp/synthea");
                assert_eq!(max_workers, Some(4));
                assert_eq!(exclude, vec!["NOTE", "NOTE_NLP", "SPECIMEN"]);
                assert_eq!(output, Some(PathBuf::from("/tmp/reports")));
                Ok(())
            }
            _ => bail!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_rejects_zero_workers() {
        let res = Cli::try_parse_from(["dqd", "run", "--max-workers", "0"]);
        assert!(res.is_err());
    }

    #[test]
    fn test_cli_parse_plan() -> Result<()> {
        let args = Cli::parse_from(["dqd", "plan", "--exclude", "DEATH"]);
        match args.command {
            Commands::Plan { exclude, .. } => {
                assert_eq!(exclude, vec!["DEATH"]);
                Ok(())
            }
            _ => bail!("Expected Plan command"),
        }
    }
}
