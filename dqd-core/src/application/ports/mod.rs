// dqd-core/src/application/ports/mod.rs

pub mod executor;
pub mod metadata;
pub mod renderer;

pub use executor::QueryExecutor;
pub use metadata::MetadataSource;
pub use renderer::TemplateEngine;
