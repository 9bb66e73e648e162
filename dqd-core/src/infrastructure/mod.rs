// dqd-core/src/infrastructure/mod.rs

pub mod adapters;
pub mod compiler;
pub mod config;
pub mod error;
pub mod fs;
pub mod report;

pub use adapters::DuckDBConnector;
pub use compiler::JinjaRenderer;
pub use config::{YamlCatalogueLoader, load_project_config};
pub use report::write_summary;
