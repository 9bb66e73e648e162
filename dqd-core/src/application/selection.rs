// dqd-core/src/application/selection.rs

use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use crate::domain::catalogue::{
    Catalogue, CheckDefinition, CheckLevel, DataElement, ElementKey, EvaluationFilter,
};
use crate::domain::error::DomainError;

/// Field name dropped from every field-level target before any check sees it.
const OFFSET_FIELD: &str = "offset";

/// Elements that survived the run-wide exclusions, grouped by level.
#[derive(Debug, Clone, Default)]
pub struct EligibleElements {
    tables: Vec<Arc<DataElement>>,
    fields: Vec<Arc<DataElement>>,
    concepts: Vec<Arc<DataElement>>,
}

impl EligibleElements {
    pub fn for_level(&self, level: CheckLevel) -> &[Arc<DataElement>] {
        match level {
            CheckLevel::Table => &self.tables,
            CheckLevel::Field => &self.fields,
            CheckLevel::Concept => &self.concepts,
        }
    }
}

/// Selects, for a check, the data model elements it applies to.
#[derive(Debug, Clone)]
pub struct ElementFilter {
    excluded_tables: HashSet<String>,
}

impl ElementFilter {
    pub fn new<S: AsRef<str>>(tables_to_exclude: &[S]) -> Self {
        Self {
            excluded_tables: tables_to_exclude
                .iter()
                .map(|t| t.as_ref().trim().to_uppercase())
                .collect(),
        }
    }

    pub fn is_excluded(&self, element: &dyn ElementKey) -> bool {
        self.excluded_tables
            .contains(&element.table_name().to_uppercase())
    }

    /// Applies the exclusion list and the `offset` rule to the whole catalogue.
    pub fn eligible(&self, catalogue: &Catalogue) -> EligibleElements {
        let tables: Vec<Arc<DataElement>> = catalogue
            .tables
            .iter()
            .filter(|t| !self.is_excluded(*t))
            .map(|t| Arc::new(DataElement::from(t.clone())))
            .collect();

        let fields: Vec<Arc<DataElement>> = catalogue
            .fields
            .iter()
            .filter(|f| !f.field_name.eq_ignore_ascii_case(OFFSET_FIELD))
            .filter(|f| !self.is_excluded(*f))
            .map(|f| Arc::new(DataElement::from(f.clone())))
            .collect();

        let concepts: Vec<Arc<DataElement>> = catalogue
            .concepts
            .iter()
            .filter(|c| !self.is_excluded(*c))
            .map(|c| Arc::new(DataElement::from(c.clone())))
            .collect();

        debug!(
            tables = tables.len(),
            fields = fields.len(),
            concepts = concepts.len(),
            "Eligible elements after exclusions"
        );

        EligibleElements {
            tables,
            fields,
            concepts,
        }
    }

    /// Elements of the check's level that satisfy its evaluation filter,
    /// in catalogue order.
    pub fn select(
        &self,
        check: &CheckDefinition,
        eligible: &EligibleElements,
    ) -> Result<Vec<Arc<DataElement>>, DomainError> {
        let level = check.level()?;
        let filter = EvaluationFilter::parse(&check.evaluation_filter).map_err(|e| {
            DomainError::InvalidEvaluationFilter {
                check: check.check_name.clone(),
                reason: e.to_string(),
            }
        })?;

        Ok(eligible
            .for_level(level)
            .iter()
            .filter(|element| filter.matches(element.attributes()))
            .cloned()
            .collect())
    }
}
