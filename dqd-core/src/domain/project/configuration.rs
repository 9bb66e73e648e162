// src/domain/project/configuration.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Version stamped into every metadata row of the report.
pub const DQD_VERSION: &str = "1.4.1";

/// Vocabulary and reference tables never targeted by checks.
pub const DEFAULT_TABLES_TO_EXCLUDE: [&str; 9] = [
    "CONCEPT",
    "VOCABULARY",
    "CONCEPT_ANCESTOR",
    "CONCEPT_RELATIONSHIP",
    "CONCEPT_CLASS",
    "CONCEPT_SYNONYM",
    "RELATIONSHIP",
    "DOMAIN",
    "DRUG_STRENGTH",
];

pub const DEFAULT_MAX_WORKERS: usize = 16;

/// Knobs of the check execution engine.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Validate)]
pub struct EngineConfig {
    /// In-flight check queries per check definition.
    #[validate(range(min = 1, max = 256))]
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    #[serde(default = "default_tables_to_exclude")]
    pub tables_to_exclude: Vec<String>,

    #[serde(default = "default_dqd_version")]
    pub dqd_version: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            tables_to_exclude: default_tables_to_exclude(),
            dqd_version: default_dqd_version(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Validate)]
pub struct ProjectConfig {
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(rename = "catalogue-path", default = "default_catalogue_path")]
    pub catalogue_path: String,

    #[serde(rename = "template-path", default = "default_template_path")]
    pub template_path: String,

    #[serde(rename = "output-path", default = "default_output_path")]
    pub output_path: String,

    #[serde(default = "default_database")]
    pub database: String,

    #[serde(rename = "cdm-schema", default = "default_cdm_schema")]
    pub cdm_schema: String,

    #[validate(nested)]
    #[serde(default)]
    pub engine: EngineConfig,
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}
fn default_tables_to_exclude() -> Vec<String> {
    DEFAULT_TABLES_TO_EXCLUDE
        .iter()
        .map(|t| t.to_string())
        .collect()
}
fn default_dqd_version() -> String {
    DQD_VERSION.to_string()
}
fn default_version() -> String {
    "0.1.0".to_string()
}
fn default_catalogue_path() -> String {
    "catalogue".to_string()
}
fn default_template_path() -> String {
    "sql".to_string()
}
fn default_output_path() -> String {
    "output".to_string()
}
fn default_database() -> String {
    "cdm.duckdb".to_string()
}
fn default_cdm_schema() -> String {
    "main".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_project_gets_defaults() {
        let config: ProjectConfig = serde_yaml::from_str("name: synthea").unwrap();
        assert_eq!(config.catalogue_path, "catalogue");
        assert_eq!(config.cdm_schema, "main");
        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.engine.max_workers, 16);
        assert_eq!(config.engine.tables_to_exclude.len(), 9);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_worker_budget_is_validated() {
        let config: ProjectConfig =
            serde_yaml::from_str("name: synthea\nengine:\n  max_workers: 0\n").unwrap();
        assert!(config.validate().is_err());
    }
}
