// dqd-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use duckdb::{Config, Connection};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::debug;

// Imports Hexagonaux
use crate::domain::quality::ViolationStats;
use crate::error::DqdError;
use crate::infrastructure::error::{DatabaseError, InfrastructureError};
use crate::ports::connector::{ColumnSchema, Connector, TextRow};

/// Embedded DuckDB backend.
///
/// Every query runs on its own cloned connection inside `spawn_blocking`,
/// so concurrent check instances do not serialize on one handle. A check
/// query that is cancelled or abandoned is interrupted on its session, so
/// no blocking thread outlives the caller.
pub struct DuckDBConnector {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDBConnector {
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();

        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            Connection::open_with_flags(db_path, config)?
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Runs one or more statements that return nothing (setup, fixtures).
    pub async fn execute_batch(&self, sql: &str) -> Result<(), DqdError> {
        let sql = sql.to_string();
        self.blocking(move |conn| conn.execute_batch(&sql).map_err(DatabaseError::from))
            .await
    }

    fn session(&self) -> Result<Connection, DatabaseError> {
        let guard = self.conn.lock().map_err(|_| DatabaseError::Poisoned)?;
        Ok(guard.try_clone()?)
    }

    async fn blocking<R, F>(&self, work: F) -> Result<R, DqdError>
    where
        F: FnOnce(Connection) -> Result<R, DatabaseError> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self.session().map_err(InfrastructureError::from)?;
        let outcome = tokio::task::spawn_blocking(move || work(conn))
            .await
            .map_err(|e| InfrastructureError::from(DatabaseError::Join(e.to_string())))?;
        outcome.map_err(|e| InfrastructureError::from(e).into())
    }

    /// Like `blocking`, but the statement is interrupted as soon as `cancel`
    /// fires or the returned future is dropped.
    async fn interruptible<R, F>(&self, cancel: &CancellationToken, work: F) -> Result<R, DqdError>
    where
        F: FnOnce(Connection) -> Result<R, DatabaseError> + Send + 'static,
        R: Send + 'static,
    {
        let conn = self.session().map_err(InfrastructureError::from)?;
        let handle = conn.interrupt_handle();
        let guard = InterruptOnDrop::new(move || handle.interrupt());

        let task = tokio::task::spawn_blocking(move || work(conn));
        let joined = tokio::select! {
            // returning drops the guard, which interrupts the statement
            _ = cancel.cancelled() => {
                return Err(InfrastructureError::from(DatabaseError::Interrupted).into());
            }
            joined = task => joined,
        };
        guard.disarm();

        let outcome =
            joined.map_err(|e| InfrastructureError::from(DatabaseError::Join(e.to_string())))?;
        outcome.map_err(|e| InfrastructureError::from(e).into())
    }
}

/// Fires the session interrupt when dropped, unless the query completed first.
struct InterruptOnDrop {
    interrupt: Option<Box<dyn FnOnce() + Send>>,
}

impl InterruptOnDrop {
    fn new(interrupt: impl FnOnce() + Send + 'static) -> Self {
        Self {
            interrupt: Some(Box::new(interrupt)),
        }
    }

    fn disarm(mut self) {
        self.interrupt = None;
    }
}

impl Drop for InterruptOnDrop {
    fn drop(&mut self) {
        if let Some(interrupt) = self.interrupt.take() {
            debug!("Interrupting in-flight DuckDB query");
            interrupt();
        }
    }
}

fn wrap_violation_query(query: &str) -> String {
    let inner = query.trim().trim_end_matches(';');
    format!(
        "SELECT CAST(num_violated_rows AS BIGINT), CAST(pct_violated_rows AS DOUBLE), \
         CAST(num_denominator_rows AS BIGINT) FROM ({}) q",
        inner
    )
}

fn non_negative(value: Option<i64>) -> u64 {
    value.and_then(|v| u64::try_from(v).ok()).unwrap_or(0)
}

#[async_trait]
impl Connector for DuckDBConnector {
    async fn query_violations(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<ViolationStats, DqdError> {
        let wrapped = wrap_violation_query(query);
        let original = query.to_string();

        self.interruptible(cancel, move |conn| {
            let mut stmt = conn.prepare(&wrapped)?;
            let mut rows = stmt.query([])?;
            let row = rows
                .next()?
                .ok_or_else(|| DatabaseError::EmptyResult(original.clone()))?;

            let violated: Option<i64> = row.get(0)?;
            let pct: Option<f64> = row.get(1)?;
            let denominator: Option<i64> = row.get(2)?;

            Ok(ViolationStats {
                num_violated_rows: non_negative(violated),
                pct_violated_rows: pct.unwrap_or(0.0),
                num_denominator_rows: non_negative(denominator),
            })
        })
        .await
    }

    async fn fetch_columns(&self, table_name: &str) -> Result<Vec<ColumnSchema>, DqdError> {
        let pragma = format!("PRAGMA table_info('{}')", table_name.replace('\'', "''"));

        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&pragma)?;
            let rows = stmt.query_map([], |row| {
                Ok(ColumnSchema {
                    name: row.get("name")?,
                    data_type: row.get("type")?,
                    is_nullable: !row.get::<_, bool>("notnull")?,
                })
            })?;

            let mut columns = Vec::new();
            for row in rows {
                columns.push(row?);
            }
            Ok(columns)
        })
        .await
    }

    async fn query_text_rows(
        &self,
        query: &str,
        columns: &[String],
    ) -> Result<Vec<TextRow>, DqdError> {
        let query = query.to_string();
        let columns = columns.to_vec();
        debug!(columns = columns.len(), "Reading rows as text");

        self.blocking(move |conn| {
            let mut stmt = conn.prepare(&query)?;
            let mut rows = stmt.query([])?;

            let mut out = Vec::new();
            while let Some(row) = rows.next()? {
                let mut record = TextRow::new();
                for (i, name) in columns.iter().enumerate() {
                    let value: Option<String> = row.get(i)?;
                    record.insert(name.clone(), value);
                }
                out.push(record);
            }
            Ok(out)
        })
        .await
    }

    fn engine_name(&self) -> &str {
        "duckdb"
    }
}
