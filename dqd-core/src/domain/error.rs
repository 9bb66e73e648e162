// dqd-core/src/domain/error.rs

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DomainError {
    #[error("Unknown check level '{level}' for check '{check}'")]
    #[diagnostic(
        code(dqd::domain::catalogue_integrity),
        help("checkLevel must be one of TABLE, FIELD or CONCEPT.")
    )]
    UnknownCheckLevel { check: String, level: String },

    #[error("Invalid evaluation filter for check '{check}': {reason}")]
    #[diagnostic(
        code(dqd::domain::catalogue_integrity),
        help("Filters look like: isRequired=='Yes' & cdmFieldName!=''")
    )]
    InvalidEvaluationFilter { check: String, reason: String },

    #[error("No check results to summarize")]
    #[diagnostic(
        code(dqd::domain::empty_run),
        help("Every check was filtered out. Check the exclusion list and the catalogue.")
    )]
    NoCheckResults,
}
