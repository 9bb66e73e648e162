// dqd-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DqdError {
    // --- ERREURS DU DOMAINE (Catalogue, Agrégation) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- ERREURS D'INFRASTRUCTURE (IO, Parsing, DuckDB) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- ERREURS GÉNÉRIQUES / APPLICATIVES ---
    #[error("Internal Error: {0}")]
    InternalError(String),
}

impl DqdError {
    /// Only catalogue-integrity problems abort a run; everything else is data.
    pub fn is_catalogue_integrity(&self) -> bool {
        matches!(
            self,
            DqdError::Domain(
                DomainError::UnknownCheckLevel { .. } | DomainError::InvalidEvaluationFilter { .. }
            )
        )
    }
}

// Manual implementation to avoid duplicate enum variant but keep ergonomics
impl From<std::io::Error> for DqdError {
    fn from(err: std::io::Error) -> Self {
        DqdError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<duckdb::Error> for DqdError {
    fn from(err: duckdb::Error) -> Self {
        DqdError::Infrastructure(err.into())
    }
}
