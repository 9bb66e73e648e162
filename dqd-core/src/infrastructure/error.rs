// dqd-core/src/infrastructure/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("DuckDB Engine Error: {0}")]
    #[diagnostic(
        code(dqd::infra::database::duckdb),
        help("An error occurred inside the SQL engine.")
    )]
    DuckDB(#[from] duckdb::Error),

    #[error("Query returned no rows: {0}")]
    #[diagnostic(code(dqd::infra::database::empty))]
    EmptyResult(String),

    #[error("DuckDB connection poisoned")]
    #[diagnostic(code(dqd::infra::database::poisoned))]
    Poisoned,

    #[error("Query interrupted")]
    #[diagnostic(code(dqd::infra::database::interrupted))]
    Interrupted,

    #[error("Blocking query task failed: {0}")]
    #[diagnostic(code(dqd::infra::database::join))]
    Join(String),
}

#[derive(Error, Debug, Diagnostic)]
pub enum InfrastructureError {
    // --- DATABASE (Abstracted) ---
    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DatabaseError),

    // --- FILESYSTEM (IO) ---
    #[error("File System Error: {0}")]
    #[diagnostic(
        code(dqd::infra::io),
        help("Check file permissions or path validity.")
    )]
    Io(#[from] std::io::Error),

    // --- CONFIG / YAML ---
    #[error("YAML Parsing Error: {0}")]
    #[diagnostic(
        code(dqd::infra::yaml),
        help("Check your YAML syntax (indentation, types).")
    )]
    YamlError(#[from] serde_yaml::Error),

    #[error("JSON Serialization Error: {0}")]
    #[diagnostic(code(dqd::infra::json))]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration Error: {0}")]
    #[diagnostic(code(dqd::infra::config))]
    ConfigError(String),

    #[error("Project configuration not found at '{0}'")]
    #[diagnostic(code(dqd::infra::config_missing))]
    ConfigNotFound(String),

    // --- CATALOGUE ---
    #[error("Catalogue file not found at '{0}'")]
    #[diagnostic(
        code(dqd::infra::catalogue_missing),
        help("The catalogue directory needs check_descriptions.yml, table_level.yml, field_level.yml and concept_level.yml.")
    )]
    CatalogueFileMissing(String),

    #[error("Catalogue file '{file}' row {row}: {reason}")]
    #[diagnostic(
        code(dqd::infra::catalogue),
        help("Every target row needs cdmTableName (and cdmFieldName / conceptId for its level).")
    )]
    CatalogueRow {
        file: String,
        row: usize,
        reason: String,
    },

    // --- TEMPLATING ---
    #[error("Template Rendering Error: {0}")]
    #[diagnostic(
        code(dqd::infra::template),
        help("Check the Jinja syntax ({{ ... }}) inside the check SQL file.")
    )]
    TemplateError(#[from] minijinja::Error),
}

// Manual implementation for shortcuts (e.g. `?` operator on duckdb calls)
impl From<duckdb::Error> for InfrastructureError {
    fn from(err: duckdb::Error) -> Self {
        InfrastructureError::Database(DatabaseError::DuckDB(err))
    }
}
