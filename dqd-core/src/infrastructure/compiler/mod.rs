// dqd-core/src/infrastructure/compiler/mod.rs

pub mod jinja;

pub use jinja::JinjaRenderer;
