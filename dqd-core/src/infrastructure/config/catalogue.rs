// dqd-core/src/infrastructure/config/catalogue.rs

use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::domain::catalogue::{
    Catalogue, CheckDefinition, ConceptElement, FieldElement, MissingAttribute, TableElement,
};
use crate::domain::ports::CatalogueLoader;
use crate::error::DqdError;
use crate::infrastructure::error::InfrastructureError;

pub const CHECK_DESCRIPTIONS_FILE: &str = "check_descriptions.yml";
pub const TABLE_LEVEL_FILE: &str = "table_level.yml";
pub const FIELD_LEVEL_FILE: &str = "field_level.yml";
pub const CONCEPT_LEVEL_FILE: &str = "concept_level.yml";

type Row = BTreeMap<String, String>;

/// Reads the catalogue from a directory of YAML files, one sequence of flat
/// maps per file.
pub struct YamlCatalogueLoader {
    dir: PathBuf,
}

impl YamlCatalogueLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read_rows(&self, file: &str) -> Result<Vec<Row>, InfrastructureError> {
        let path = self.dir.join(file);
        if !path.exists() {
            return Err(InfrastructureError::CatalogueFileMissing(
                path.display().to_string(),
            ));
        }
        let content = fs::read_to_string(&path)?;
        let rows: Option<Vec<BTreeMap<String, Value>>> = serde_yaml::from_str(&content)?;

        Ok(rows
            .unwrap_or_default()
            .into_iter()
            .map(|row| row.into_iter().map(|(k, v)| (k, stringify(&v))).collect())
            .collect())
    }

    fn load_checks(&self) -> Result<Vec<CheckDefinition>, InfrastructureError> {
        self.read_rows(CHECK_DESCRIPTIONS_FILE)?
            .into_iter()
            .enumerate()
            .map(|(i, row)| {
                serde_yaml::to_value(row)
                    .and_then(serde_yaml::from_value::<CheckDefinition>)
                    .map_err(|e| row_error(CHECK_DESCRIPTIONS_FILE, i, e))
            })
            .collect()
    }

    fn load_elements<T>(
        &self,
        file: &str,
        build: fn(Row) -> Result<T, MissingAttribute>,
    ) -> Result<Vec<T>, InfrastructureError> {
        self.read_rows(file)?
            .into_iter()
            .enumerate()
            .map(|(i, row)| build(row).map_err(|e| row_error(file, i, e)))
            .collect()
    }
}

impl CatalogueLoader for YamlCatalogueLoader {
    #[instrument(skip(self), fields(dir = %self.dir.display()))]
    fn load(&self) -> Result<Catalogue, DqdError> {
        let catalogue = Catalogue {
            checks: self.load_checks()?,
            tables: self.load_elements(TABLE_LEVEL_FILE, TableElement::from_row)?,
            fields: self.load_elements(FIELD_LEVEL_FILE, FieldElement::from_row)?,
            concepts: self.load_elements(CONCEPT_LEVEL_FILE, ConceptElement::from_row)?,
        };
        info!(
            checks = catalogue.checks.len(),
            tables = catalogue.tables.len(),
            fields = catalogue.fields.len(),
            concepts = catalogue.concepts.len(),
            "Catalogue read"
        );
        Ok(catalogue)
    }
}

fn row_error(file: &str, index: usize, reason: impl ToString) -> InfrastructureError {
    InfrastructureError::CatalogueRow {
        file: file.to_string(),
        row: index + 1,
        reason: reason.to_string(),
    }
}

/// Catalogue cells are compared as text; null becomes the empty string.
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => stringify(&tagged.value),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

/// Loader rooted at `dir`, relative paths resolved against `project_dir`.
pub fn catalogue_loader(project_dir: &Path, dir: &str) -> YamlCatalogueLoader {
    YamlCatalogueLoader::new(project_dir.join(dir))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::catalogue::{CheckLevel, ElementKey};
    use anyhow::Result;
    use tempfile::tempdir;

    fn write_catalogue(dir: &Path, fields: &str) -> Result<()> {
        fs::write(
            dir.join(CHECK_DESCRIPTIONS_FILE),
            r#"
- checkLevel: TABLE
  checkName: cdmTable
  checkDescription: "A yes or no value indicating if {cdmTableName} exists."
  kahnContext: Verification
  kahnCategory: Conformance
  kahnSubcategory: Relational
  sqlFile: table_cdm_table.sql
  evaluationFilter: cdmTableName!=''
  severity: fatal
- checkLevel: FIELD
  checkName: isRequired
  checkDescription: required fields are populated
  kahnContext: Validation
  kahnCategory: Conformance
  kahnSubcategory: Relational
  sqlFile: field_is_not_nullable.sql
  evaluationFilter: isRequired=='Yes'
  severity:
"#,
        )?;
        fs::write(
            dir.join(TABLE_LEVEL_FILE),
            "- cdmTableName: PERSON\n  cdmTableNameThreshold: 0\n- cdmTableName: DEATH\n",
        )?;
        fs::write(dir.join(FIELD_LEVEL_FILE), fields)?;
        fs::write(dir.join(CONCEPT_LEVEL_FILE), "[]\n")?;
        Ok(())
    }

    #[test]
    fn test_load_catalogue() -> Result<()> {
        let dir = tempdir()?;
        write_catalogue(
            dir.path(),
            r#"
- cdmTableName: PERSON
  cdmFieldName: year_of_birth
  isRequired: Yes
  isRequiredThreshold: 5
  isRequiredNotes: births before 1900 are kept
  plausibleValueLow: 1850
- cdmTableName: PERSON
  cdmFieldName: month_of_birth
  isRequired: No
  isRequiredThreshold:
"#,
        )?;

        let catalogue = YamlCatalogueLoader::new(dir.path()).load()?;

        assert_eq!(catalogue.checks.len(), 2);
        assert_eq!(catalogue.checks[1].level()?, CheckLevel::Field);
        assert_eq!(catalogue.checks[1].severity.as_deref(), Some(""));
        assert_eq!(catalogue.tables.len(), 2);
        assert_eq!(catalogue.tables[1].table_name(), "DEATH");

        let year = &catalogue.fields[0];
        assert_eq!(year.attributes.get("plausibleValueLow"), Some("1850"));
        assert_eq!(year.attributes.get("isRequired"), Some("Yes"));
        let threshold = year.attributes.threshold_for("isRequired").unwrap();
        assert_eq!(threshold.threshold.as_deref(), Some("5"));
        assert_eq!(
            threshold.notes.as_deref(),
            Some("births before 1900 are kept")
        );

        // an empty threshold cell still counts as configured
        let month = &catalogue.fields[1];
        let threshold = month.attributes.threshold_for("isRequired").unwrap();
        assert_eq!(threshold.threshold.as_deref(), Some(""));
        assert!(catalogue.concepts.is_empty());
        Ok(())
    }

    #[test]
    fn test_row_without_field_name_is_rejected() -> Result<()> {
        let dir = tempdir()?;
        write_catalogue(dir.path(), "- cdmTableName: PERSON\n  isRequired: Yes\n")?;

        let err = YamlCatalogueLoader::new(dir.path()).load().unwrap_err();
        match err {
            DqdError::Infrastructure(InfrastructureError::CatalogueRow { file, row, reason }) => {
                assert_eq!(file, FIELD_LEVEL_FILE);
                assert_eq!(row, 1);
                assert!(reason.contains("cdmFieldName"));
            }
            other => panic!("expected a catalogue row error, got {:?}", other),
        }
        Ok(())
    }

    #[test]
    fn test_missing_file_is_reported() -> Result<()> {
        let dir = tempdir()?;
        let err = catalogue_loader(dir.path(), ".").load().unwrap_err();
        assert!(matches!(
            err,
            DqdError::Infrastructure(InfrastructureError::CatalogueFileMissing(_))
        ));
        Ok(())
    }

    #[test]
    fn test_stringify_scalars() {
        assert_eq!(stringify(&Value::Null), "");
        assert_eq!(stringify(&serde_yaml::from_str::<Value>("0.25").unwrap()), "0.25");
        assert_eq!(stringify(&serde_yaml::from_str::<Value>("42").unwrap()), "42");
        assert_eq!(stringify(&Value::Bool(true)), "true");
    }
}
