// src/domain/ports/mod.rs

pub mod catalogue;

pub use catalogue::CatalogueLoader;
