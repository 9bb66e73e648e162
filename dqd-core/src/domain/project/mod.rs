// dqd-core/src/domain/project/mod.rs

pub mod configuration;
pub use configuration::{
    DEFAULT_MAX_WORKERS, DEFAULT_TABLES_TO_EXCLUDE, DQD_VERSION, EngineConfig, ProjectConfig,
};
