// dqd-core/src/domain/catalogue/element.rs

use std::collections::BTreeMap;
use thiserror::Error;

use super::check::CheckLevel;

pub const TABLE_NAME: &str = "cdmTableName";
pub const FIELD_NAME: &str = "cdmFieldName";
pub const CONCEPT_ID: &str = "conceptId";
pub const UNIT_CONCEPT_ID: &str = "unitConceptId";

const THRESHOLD_SUFFIX: &str = "Threshold";
const NOTES_SUFFIX: &str = "Notes";

#[derive(Debug, Error, PartialEq)]
#[error("missing required attribute '{0}'")]
pub struct MissingAttribute(pub &'static str);

/// Identity of a data model element, independent of its level.
pub trait ElementKey {
    fn table_name(&self) -> &str;

    fn field_name(&self) -> Option<&str> {
        None
    }

    fn concept_id(&self) -> Option<&str> {
        None
    }

    fn unit_concept_id(&self) -> Option<&str> {
        None
    }
}

/// Per-check tolerance configured on an element (`{check}Threshold` / `{check}Notes`).
/// The threshold stays raw: the evaluator owns the number parsing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdOverride {
    pub threshold: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElementAttributes {
    values: BTreeMap<String, String>,
    thresholds: BTreeMap<String, ThresholdOverride>,
}

impl ElementAttributes {
    pub fn from_row(row: BTreeMap<String, String>) -> Self {
        let mut attributes = Self::default();
        for (key, value) in row {
            attributes.insert(key, value);
        }
        attributes
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();

        if let Some(check) = key.strip_suffix(THRESHOLD_SUFFIX).filter(|c| !c.is_empty()) {
            self.thresholds.entry(check.to_string()).or_default().threshold = Some(value.clone());
        } else if let Some(check) = key.strip_suffix(NOTES_SUFFIX).filter(|c| !c.is_empty()) {
            let notes = (!value.is_empty()).then(|| value.clone());
            self.thresholds.entry(check.to_string()).or_default().notes = notes;
        }

        self.values.insert(key, value);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// The override for `check_name`, only when a threshold column exists for it.
    pub fn threshold_for(&self, check_name: &str) -> Option<&ThresholdOverride> {
        self.thresholds
            .get(check_name)
            .filter(|t| t.threshold.is_some())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn required(&self, name: &'static str) -> Result<String, MissingAttribute> {
        self.get(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or(MissingAttribute(name))
    }

    fn optional(&self, name: &str) -> Option<String> {
        self.get(name)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableElement {
    pub table_name: String,
    pub attributes: ElementAttributes,
}

impl TableElement {
    pub fn new(table_name: impl Into<String>) -> Self {
        let table_name = table_name.into();
        let mut attributes = ElementAttributes::default();
        attributes.insert(TABLE_NAME, table_name.clone());
        Self {
            table_name,
            attributes,
        }
    }

    pub fn from_row(row: BTreeMap<String, String>) -> Result<Self, MissingAttribute> {
        let attributes = ElementAttributes::from_row(row);
        Ok(Self {
            table_name: attributes.required(TABLE_NAME)?,
            attributes,
        })
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key, value);
        self
    }
}

impl ElementKey for TableElement {
    fn table_name(&self) -> &str {
        &self.table_name
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldElement {
    pub table_name: String,
    pub field_name: String,
    pub attributes: ElementAttributes,
}

impl FieldElement {
    pub fn new(table_name: impl Into<String>, field_name: impl Into<String>) -> Self {
        let table_name = table_name.into();
        let field_name = field_name.into();
        let mut attributes = ElementAttributes::default();
        attributes.insert(TABLE_NAME, table_name.clone());
        attributes.insert(FIELD_NAME, field_name.clone());
        Self {
            table_name,
            field_name,
            attributes,
        }
    }

    pub fn from_row(row: BTreeMap<String, String>) -> Result<Self, MissingAttribute> {
        let attributes = ElementAttributes::from_row(row);
        Ok(Self {
            table_name: attributes.required(TABLE_NAME)?,
            field_name: attributes.required(FIELD_NAME)?,
            attributes,
        })
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key, value);
        self
    }
}

impl ElementKey for FieldElement {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field_name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConceptElement {
    pub table_name: String,
    pub field_name: String,
    pub concept_id: String,
    pub unit_concept_id: Option<String>,
    pub attributes: ElementAttributes,
}

impl ConceptElement {
    pub fn new(
        table_name: impl Into<String>,
        field_name: impl Into<String>,
        concept_id: impl Into<String>,
    ) -> Self {
        let table_name = table_name.into();
        let field_name = field_name.into();
        let concept_id = concept_id.into();
        let mut attributes = ElementAttributes::default();
        attributes.insert(TABLE_NAME, table_name.clone());
        attributes.insert(FIELD_NAME, field_name.clone());
        attributes.insert(CONCEPT_ID, concept_id.clone());
        Self {
            table_name,
            field_name,
            concept_id,
            unit_concept_id: None,
            attributes,
        }
    }

    pub fn from_row(row: BTreeMap<String, String>) -> Result<Self, MissingAttribute> {
        let attributes = ElementAttributes::from_row(row);
        Ok(Self {
            table_name: attributes.required(TABLE_NAME)?,
            field_name: attributes.required(FIELD_NAME)?,
            concept_id: attributes.required(CONCEPT_ID)?,
            unit_concept_id: attributes.optional(UNIT_CONCEPT_ID),
            attributes,
        })
    }

    pub fn with_unit(mut self, unit_concept_id: &str) -> Self {
        self.unit_concept_id = Some(unit_concept_id.to_string());
        self.attributes.insert(UNIT_CONCEPT_ID, unit_concept_id);
        self
    }

    pub fn with_attribute(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key, value);
        self
    }
}

impl ElementKey for ConceptElement {
    fn table_name(&self) -> &str {
        &self.table_name
    }

    fn field_name(&self) -> Option<&str> {
        Some(&self.field_name)
    }

    fn concept_id(&self) -> Option<&str> {
        Some(&self.concept_id)
    }

    fn unit_concept_id(&self) -> Option<&str> {
        self.unit_concept_id.as_deref()
    }
}

/// A target row of any level, as bound into a check instance.
#[derive(Debug, Clone, PartialEq)]
pub enum DataElement {
    Table(TableElement),
    Field(FieldElement),
    Concept(ConceptElement),
}

impl DataElement {
    pub fn level(&self) -> CheckLevel {
        match self {
            DataElement::Table(_) => CheckLevel::Table,
            DataElement::Field(_) => CheckLevel::Field,
            DataElement::Concept(_) => CheckLevel::Concept,
        }
    }

    pub fn attributes(&self) -> &ElementAttributes {
        match self {
            DataElement::Table(e) => &e.attributes,
            DataElement::Field(e) => &e.attributes,
            DataElement::Concept(e) => &e.attributes,
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes().get(name)
    }

    fn key(&self) -> &dyn ElementKey {
        match self {
            DataElement::Table(e) => e as &dyn ElementKey,
            DataElement::Field(e) => e as &dyn ElementKey,
            DataElement::Concept(e) => e as &dyn ElementKey,
        }
    }
}

impl ElementKey for DataElement {
    fn table_name(&self) -> &str {
        self.key().table_name()
    }

    fn field_name(&self) -> Option<&str> {
        self.key().field_name()
    }

    fn concept_id(&self) -> Option<&str> {
        self.key().concept_id()
    }

    fn unit_concept_id(&self) -> Option<&str> {
        self.key().unit_concept_id()
    }
}

impl From<TableElement> for DataElement {
    fn from(e: TableElement) -> Self {
        DataElement::Table(e)
    }
}

impl From<FieldElement> for DataElement {
    fn from(e: FieldElement) -> Self {
        DataElement::Field(e)
    }
}

impl From<ConceptElement> for DataElement {
    fn from(e: ConceptElement) -> Self {
        DataElement::Concept(e)
    }
}
