// dqd/src/commands/mod.rs

pub mod plan;
pub mod run;

use anyhow::Context;
use std::path::{Path, PathBuf};

use dqd_core::DqdError;
use dqd_core::domain::project::ProjectConfig;
use dqd_core::infrastructure::config::project::load_project_config;

/// Loads the project file and merges the CLI exclusions into it.
pub fn load_config(project_dir: &Path, exclude: Vec<String>) -> anyhow::Result<ProjectConfig> {
    let mut config = load_project_config(project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;
    config.engine.tables_to_exclude.extend(exclude);
    Ok(config)
}

/// Paths in the project file are relative to the project directory.
pub fn resolve(project_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        project_dir.join(p)
    }
}

/// Prints a fatal engine error with its diagnostic code and help, then exits 1.
pub fn exit_with(context: &str, err: DqdError) -> ! {
    let report = match err {
        DqdError::Domain(e) => miette::Report::new(e),
        DqdError::Infrastructure(e) => miette::Report::new(e),
        DqdError::InternalError(msg) => miette::miette!("{}", msg),
    };
    eprintln!("\n💥 {}", context);
    eprintln!("{:?}", report);
    std::process::exit(1);
}
