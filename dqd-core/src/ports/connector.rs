// dqd-core/src/ports/connector.rs

// What the engine needs from a SQL backend, without knowing which one it is.

use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio_util::sync::CancellationToken;

use crate::domain::quality::ViolationStats;
use crate::error::DqdError;

// Struct simple pour décrire une colonne (indépendant de la DB)
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: String,
    pub is_nullable: bool,
}

/// One result row, every value rendered as text (`None` for SQL NULL).
pub type TextRow = BTreeMap<String, Option<String>>;

#[async_trait]
pub trait Connector: Send + Sync {
    /// Runs a check query. It must return one row with the columns
    /// `num_violated_rows`, `pct_violated_rows` and `num_denominator_rows`.
    /// Cancelling `cancel`, or dropping the future, stops the query on the
    /// backend as well.
    async fn query_violations(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<ViolationStats, DqdError>;

    async fn fetch_columns(&self, table_name: &str) -> Result<Vec<ColumnSchema>, DqdError>;

    /// Runs `query` and reads back `columns` of every row as text.
    async fn query_text_rows(
        &self,
        query: &str,
        columns: &[String],
    ) -> Result<Vec<TextRow>, DqdError>;

    fn engine_name(&self) -> &str;
}
