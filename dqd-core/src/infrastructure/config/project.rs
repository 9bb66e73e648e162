// dqd-core/src/infrastructure/config/project.rs

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::domain::project::configuration::ProjectConfig;
use crate::infrastructure::error::InfrastructureError;

pub const CONFIG_CANDIDATES: [&str; 2] = ["dqd_project.yaml", "dqd.yaml"];

#[instrument(skip(project_dir))] // Log automatique de l'entrée/sortie de la fonction
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    // 1. Découverte du fichier principal
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project configuration");

    // 2. Chargement YAML Base
    let content = fs::read_to_string(&config_path)?;
    let mut config: ProjectConfig = serde_yaml::from_str(&content)?;

    // 3. Override via Variables d'Environnement (Pattern 'Layering')
    // Permet de faire: DQD_MAX_WORKERS=4 dqd run
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config
        .validate()
        .map_err(|e| InfrastructureError::ConfigError(e.to_string()))?;

    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    for filename in CONFIG_CANDIDATES {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "{} (checked: {:?})",
        root.display(),
        CONFIG_CANDIDATES
    )))
}

pub fn apply_env_overrides<F>(config: &mut ProjectConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("DQD_MAX_WORKERS") {
        match val.trim().parse::<usize>() {
            Ok(workers) => {
                info!(old = config.engine.max_workers, new = workers, "Overriding max workers via ENV");
                config.engine.max_workers = workers;
            }
            Err(_) => warn!(value = %val, "Ignoring non-numeric DQD_MAX_WORKERS"),
        }
    }
    if let Some(val) = lookup("DQD_OUTPUT_PATH") {
        info!(old = ?config.output_path, new = ?val, "Overriding output path via ENV");
        config.output_path = val;
    }
    if let Some(val) = lookup("DQD_DATABASE") {
        info!(old = ?config.database, new = ?val, "Overriding database via ENV");
        config.database = val;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_load_project_config() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("dqd.yaml"),
            "name: synthea\ndatabase: synthea.duckdb\nengine:\n  max_workers: 4\n  tables_to_exclude: [CONCEPT]\n",
        )?;

        let config = load_project_config(dir.path())?;
        assert_eq!(config.name, "synthea");
        assert_eq!(config.database, "synthea.duckdb");
        assert_eq!(config.engine.max_workers, 4);
        assert_eq!(config.engine.tables_to_exclude, vec!["CONCEPT".to_string()]);
        assert_eq!(config.engine.dqd_version, "1.4.1");
        Ok(())
    }

    #[test]
    fn test_missing_config() {
        let dir = tempdir().unwrap();
        let res = load_project_config(dir.path());
        assert!(matches!(res, Err(InfrastructureError::ConfigNotFound(_))));
    }

    #[test]
    fn test_out_of_range_workers_are_rejected() -> Result<()> {
        let dir = tempdir()?;
        fs::write(
            dir.path().join("dqd_project.yaml"),
            "name: synthea\nengine:\n  max_workers: 1000\n",
        )?;
        let res = load_project_config(dir.path());
        assert!(matches!(res, Err(InfrastructureError::ConfigError(_))));
        Ok(())
    }

    #[test]
    fn test_env_overrides() -> Result<()> {
        let mut config: ProjectConfig = serde_yaml::from_str("name: synthea")?;
        let env: HashMap<&str, &str> = [
            ("DQD_MAX_WORKERS", "8"),
            ("DQD_OUTPUT_PATH", "/tmp/reports"),
        ]
        .into_iter()
        .collect();

        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.engine.max_workers, 8);
        assert_eq!(config.output_path, "/tmp/reports");
        assert_eq!(config.database, "cdm.duckdb");
        Ok(())
    }

    #[test]
    fn test_bad_worker_override_is_ignored() -> Result<()> {
        let mut config: ProjectConfig = serde_yaml::from_str("name: synthea")?;
        apply_env_overrides(&mut config, |k| {
            (k == "DQD_MAX_WORKERS").then(|| "many".to_string())
        });
        assert_eq!(config.engine.max_workers, 16);
        Ok(())
    }
}
