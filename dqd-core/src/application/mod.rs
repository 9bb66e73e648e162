// dqd-core/src/application/mod.rs

pub mod engine;
pub mod executor;
pub mod metadata;
pub mod ports;
pub mod runner;
pub mod selection;

// --- RE-EXPORTS (FACADE PATTERN) ---
// Cela permet au CLI de faire :
// `use dqd_core::application::{DataQualityEngine, SqlQueryExecutor};`
// sans avoir à connaître la structure interne des fichiers.

pub use engine::{DataQualityEngine, RunState, expand};
pub use executor::SqlQueryExecutor;
pub use metadata::{CdmSourceMetadata, capture_metadata};
pub use runner::{CANCELLED, CheckBatch, CheckRunner};
pub use selection::{EligibleElements, ElementFilter};
