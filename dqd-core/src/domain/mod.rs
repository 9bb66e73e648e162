pub mod catalogue;
pub mod error;
pub mod ports;
pub mod project;
pub mod quality;

// Re-exports pratiques pour simplifier les imports ailleurs
pub use error::DomainError;
