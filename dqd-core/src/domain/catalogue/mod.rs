// dqd-core/src/domain/catalogue/mod.rs

pub mod check;
pub mod element;
pub mod filter;

pub use check::{CheckDefinition, CheckLevel};
pub use element::{
    ConceptElement, DataElement, ElementAttributes, ElementKey, FieldElement, MissingAttribute,
    TableElement, ThresholdOverride,
};
pub use filter::{EvaluationFilter, FilterParseError};

/// The four catalogue tables, as loaded.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalogue {
    pub checks: Vec<CheckDefinition>,
    pub tables: Vec<TableElement>,
    pub fields: Vec<FieldElement>,
    pub concepts: Vec<ConceptElement>,
}

impl Catalogue {
    pub fn element_count(&self) -> usize {
        self.tables.len() + self.fields.len() + self.concepts.len()
    }
}
