// dqd-core/src/application/metadata.rs

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use crate::application::ports::MetadataSource;
use crate::domain::quality::SourceMetadata;
use crate::error::DqdError;
use crate::ports::connector::Connector;

pub const DQD_VERSION_KEY: &str = "DQD_VERSION";

/// Collects the source rows for the report: keys upper-cased, each row
/// stamped with the engine version. A failing source is logged and yields
/// no metadata.
#[instrument(skip(source))]
pub async fn capture_metadata(source: &dyn MetadataSource, dqd_version: &str) -> Vec<SourceMetadata> {
    match source.source_metadata().await {
        Ok(rows) => {
            debug!(rows = rows.len(), "Source metadata captured");
            rows.into_iter()
                .map(|row| {
                    let mut normalized: SourceMetadata = row
                        .into_iter()
                        .map(|(k, v)| (k.to_uppercase(), v))
                        .collect();
                    normalized.insert(DQD_VERSION_KEY.to_string(), Value::from(dqd_version));
                    normalized
                })
                .collect()
        }
        Err(e) => {
            warn!(error = %e, "Could not capture source metadata, the report will carry none");
            Vec::new()
        }
    }
}

/// Reads every row of the CDM's `cdm_source` table as text.
pub struct CdmSourceMetadata {
    connector: Arc<dyn Connector>,
    schema: String,
    table: String,
}

impl CdmSourceMetadata {
    pub fn new(connector: Arc<dyn Connector>, schema: impl Into<String>) -> Self {
        Self {
            connector,
            schema: schema.into(),
            table: "cdm_source".to_string(),
        }
    }

    fn qualified_table(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.table))
    }
}

#[async_trait]
impl MetadataSource for CdmSourceMetadata {
    async fn source_metadata(&self) -> Result<Vec<SourceMetadata>, DqdError> {
        let columns = self
            .connector
            .fetch_columns(&format!("{}.{}", self.schema, self.table))
            .await?;
        if columns.is_empty() {
            return Ok(Vec::new());
        }

        let names: Vec<String> = columns.into_iter().map(|c| c.name).collect();
        let projection = names
            .iter()
            .map(|n| format!("CAST({} AS VARCHAR) AS {}", quote_ident(n), quote_ident(n)))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!("SELECT {} FROM {}", projection, self.qualified_table());

        let rows = self.connector.query_text_rows(&query, &names).await?;
        Ok(rows
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|(k, v)| (k, v.map(Value::String).unwrap_or(Value::Null)))
                    .collect()
            })
            .collect())
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::infrastructure::error::InfrastructureError;

    struct StaticSource(Vec<SourceMetadata>);

    #[async_trait]
    impl MetadataSource for StaticSource {
        async fn source_metadata(&self) -> Result<Vec<SourceMetadata>, DqdError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenSource;

    #[async_trait]
    impl MetadataSource for BrokenSource {
        async fn source_metadata(&self) -> Result<Vec<SourceMetadata>, DqdError> {
            Err(InfrastructureError::ConfigError("cdm_source missing".into()).into())
        }
    }

    #[tokio::test]
    async fn test_keys_are_upper_cased_and_version_added() {
        let mut row = SourceMetadata::new();
        row.insert("cdm_source_abbreviation".into(), Value::from("SYN"));
        row.insert("cdm_version".into(), Value::from("5.4"));

        let metadata = capture_metadata(&StaticSource(vec![row]), "1.4.1").await;

        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata[0]["CDM_SOURCE_ABBREVIATION"], "SYN");
        assert_eq!(metadata[0]["CDM_VERSION"], "5.4");
        assert_eq!(metadata[0][DQD_VERSION_KEY], "1.4.1");
        assert!(!metadata[0].contains_key("cdm_version"));
    }

    #[tokio::test]
    async fn test_failing_source_yields_no_metadata() {
        let metadata = capture_metadata(&BrokenSource, "1.4.1").await;
        assert!(metadata.is_empty());
    }

    #[test]
    fn test_identifier_quoting() {
        assert_eq!(quote_ident("cdm_source"), "\"cdm_source\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
