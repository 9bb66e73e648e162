// dqd-core/src/domain/quality/instance.rs

use serde::{Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::domain::catalogue::{CheckDefinition, DataElement, ElementKey};

/// `{check}.{element}` position of a result inside its check's batch (1-based).
/// Ordering is numeric, so `1.2` sorts before `1.10`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProvenanceId {
    check: usize,
    element: usize,
}

impl ProvenanceId {
    /// Builds the id from 0-based ordinals.
    pub fn from_ordinals(check_ordinal: usize, element_ordinal: usize) -> Self {
        Self {
            check: check_ordinal + 1,
            element: element_ordinal + 1,
        }
    }
}

impl fmt::Display for ProvenanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.check, self.element)
    }
}

impl Serialize for ProvenanceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One check bound to one eligible element.
#[derive(Debug, Clone)]
pub struct CheckInstance {
    pub provenance: ProvenanceId,
    pub check: Arc<CheckDefinition>,
    pub element: Arc<DataElement>,
}

impl CheckInstance {
    pub fn check_id(&self) -> String {
        check_id(&self.check, self.element.as_ref())
    }
}

/// `level_name_table[_field][_concept][_unit]`, lower-cased.
pub fn check_id(check: &CheckDefinition, element: &dyn ElementKey) -> String {
    let mut parts = vec![
        check.check_level.to_lowercase(),
        check.check_name.to_lowercase(),
        element.table_name().to_lowercase(),
    ];
    parts.extend(
        [
            element.field_name(),
            element.concept_id(),
            element.unit_concept_id(),
        ]
        .into_iter()
        .flatten()
        .map(str::to_lowercase),
    );
    parts.join("_")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::catalogue::{ConceptElement, FieldElement, TableElement};

    fn definition(level: &str, name: &str) -> CheckDefinition {
        CheckDefinition {
            check_level: level.into(),
            check_name: name.into(),
            check_description: String::new(),
            kahn_context: String::new(),
            kahn_category: String::new(),
            kahn_subcategory: String::new(),
            sql_file: String::new(),
            evaluation_filter: String::new(),
            severity: None,
        }
    }

    #[test]
    fn test_provenance_display_is_one_based() {
        assert_eq!(ProvenanceId::from_ordinals(0, 0).to_string(), "1.1");
        assert_eq!(ProvenanceId::from_ordinals(3, 11).to_string(), "4.12");
    }

    #[test]
    fn test_provenance_orders_numerically() {
        let mut ids: Vec<ProvenanceId> = [(0, 9), (0, 1), (0, 0), (1, 0)]
            .iter()
            .map(|&(check, element)| ProvenanceId::from_ordinals(check, element))
            .collect();
        ids.sort();
        let rendered: Vec<String> = ids.iter().map(|id| id.to_string()).collect();
        assert_eq!(rendered, vec!["1.1", "1.2", "1.10", "2.1"]);
    }

    #[test]
    fn test_check_id_per_level() {
        let table = TableElement::new("PERSON");
        assert_eq!(
            check_id(&definition("TABLE", "cdmTable"), &table),
            "table_cdmtable_person"
        );

        let field = FieldElement::new("PERSON", "Gender_Concept_Id");
        assert_eq!(
            check_id(&definition("FIELD", "isRequired"), &field),
            "field_isrequired_person_gender_concept_id"
        );

        let concept = ConceptElement::new("MEASUREMENT", "measurement_concept_id", "3025315");
        assert_eq!(
            check_id(&definition("CONCEPT", "plausibleValueLow"), &concept),
            "concept_plausiblevaluelow_measurement_measurement_concept_id_3025315"
        );

        let with_unit = concept.with_unit("9529");
        assert_eq!(
            check_id(&definition("CONCEPT", "plausibleValueLow"), &with_unit),
            "concept_plausiblevaluelow_measurement_measurement_concept_id_3025315_9529"
        );
    }
}
