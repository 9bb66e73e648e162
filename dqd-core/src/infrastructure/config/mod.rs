// dqd-core/src/infrastructure/config/mod.rs

pub mod catalogue;
pub mod project;

pub use crate::domain::project::ProjectConfig;
pub use catalogue::{YamlCatalogueLoader, catalogue_loader};
pub use project::load_project_config;
