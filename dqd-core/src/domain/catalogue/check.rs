// dqd-core/src/domain/catalogue/check.rs

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::error::DomainError;

/// Granularity of the data model a check targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckLevel {
    Table,
    Field,
    Concept,
}

impl CheckLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckLevel::Table => "TABLE",
            CheckLevel::Field => "FIELD",
            CheckLevel::Concept => "CONCEPT",
        }
    }
}

impl fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the check descriptions table.
///
/// The level is kept as loaded: an unknown level is a catalogue-integrity
/// problem reported when the run expands its checks, not a load failure.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CheckDefinition {
    pub check_level: String,
    pub check_name: String,
    #[serde(default)]
    pub check_description: String,
    #[serde(default)]
    pub kahn_context: String,
    #[serde(default)]
    pub kahn_category: String,
    #[serde(default)]
    pub kahn_subcategory: String,
    #[serde(default)]
    pub sql_file: String,
    #[serde(default)]
    pub evaluation_filter: String,
    #[serde(default)]
    pub severity: Option<String>,
}

impl CheckDefinition {
    pub fn level(&self) -> Result<CheckLevel, DomainError> {
        match self.check_level.trim() {
            "TABLE" => Ok(CheckLevel::Table),
            "FIELD" => Ok(CheckLevel::Field),
            "CONCEPT" => Ok(CheckLevel::Concept),
            other => Err(DomainError::UnknownCheckLevel {
                check: self.check_name.clone(),
                level: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(level: &str) -> CheckDefinition {
        CheckDefinition {
            check_level: level.into(),
            check_name: "cdmTable".into(),
            check_description: String::new(),
            kahn_context: "Verification".into(),
            kahn_category: "Conformance".into(),
            kahn_subcategory: "Relational".into(),
            sql_file: "table_cdm_table.sql".into(),
            evaluation_filter: "cdmTableName!=''".into(),
            severity: None,
        }
    }

    #[test]
    fn test_known_levels() {
        assert_eq!(check("TABLE").level().ok(), Some(CheckLevel::Table));
        assert_eq!(check("FIELD").level().ok(), Some(CheckLevel::Field));
        assert_eq!(check(" CONCEPT ").level().ok(), Some(CheckLevel::Concept));
    }

    #[test]
    fn test_unknown_level_is_integrity_error() {
        let res = check("SCHEMA").level();
        assert!(matches!(
            res,
            Err(DomainError::UnknownCheckLevel { ref level, .. }) if level == "SCHEMA"
        ));
    }

    #[test]
    fn test_lowercase_level_is_rejected() {
        assert!(check("table").level().is_err());
    }
}
