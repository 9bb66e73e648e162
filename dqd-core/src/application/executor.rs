// dqd-core/src/application/executor.rs

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::{Arc, OnceLock};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::application::ports::{QueryExecutor, TemplateEngine};
use crate::application::runner::CANCELLED;
use crate::domain::catalogue::DataElement;
use crate::domain::quality::{CheckInstance, ExecutionOutcome, QueryRun};
use crate::error::DqdError;
use crate::ports::connector::Connector;

/// Element attributes handed to the check templates as lower-cased identifiers.
const IDENTIFIER_PARAMS: [&str; 14] = [
    "cdmTableName",
    "cdmFieldName",
    "cdmSourceFieldName",
    "fkTableName",
    "fkFieldName",
    "standardConceptFieldName",
    "cdmDatatype",
    "plausibleTemporalAfterTableName",
    "plausibleTemporalAfterFieldName",
    "fkDomain",
    "fkClass",
    "conceptId",
    "unitConceptId",
    "plausibleUnitConceptIds",
];

/// Always present in the context, `null` when the element lacks them.
const VERBATIM_PARAMS: [&str; 2] = ["cohortDefinitionId", "plausibleValueLow"];

const PLAUSIBLE_VALUE_HIGH: &str = "plausibleValueHigh";

fn re_domain_concept() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"domain_concept_id_")
            .unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

fn re_cost_domain() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"cost_domain_id")
            .unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

/// Field names used by the catalogue that differ from the physical CDM columns.
pub fn physical_field_name(field: &str) -> String {
    let lowered = field.to_lowercase();
    let renamed = re_domain_concept().replace_all(&lowered, "field_concept_id_");
    re_cost_domain()
        .replace_all(&renamed, "cost_field_concept_id")
        .into_owned()
}

/// The catalogue writes date bounds as SQL Server expressions.
pub fn translate_plausible_value_high(value: &str) -> String {
    match value.trim() {
        "DATEADD(dd,1,GETDATE())" => "current_date + INTERVAL 1 DAY".to_string(),
        "YEAR(GETDATE())+1" => "year(current_date) + 1".to_string(),
        other => other.to_string(),
    }
}

/// Renders a check's SQL template for an element and runs it on the backend.
pub struct SqlQueryExecutor<T: TemplateEngine> {
    connector: Arc<dyn Connector>,
    renderer: Arc<T>,
    cdm_schema: String,
}

impl<T: TemplateEngine> SqlQueryExecutor<T> {
    pub fn new(connector: Arc<dyn Connector>, renderer: Arc<T>, cdm_schema: impl Into<String>) -> Self {
        Self {
            connector,
            renderer,
            cdm_schema: cdm_schema.into(),
        }
    }

    /// Template parameters for one element: every attribute as loaded, then
    /// the identifier and date-bound adjustments. Empty attributes are `null`.
    pub fn render_context(&self, element: &DataElement) -> Value {
        let present = |name: &str| element.attribute(name).map(str::trim).filter(|v| !v.is_empty());

        let mut ctx: Map<String, Value> = element
            .attributes()
            .iter()
            .map(|(name, value)| {
                let value = value.trim();
                let value = if value.is_empty() {
                    Value::Null
                } else {
                    Value::from(value)
                };
                (name.to_string(), value)
            })
            .collect();
        ctx.insert("cdm_schema".into(), Value::from(self.cdm_schema.as_str()));

        for name in IDENTIFIER_PARAMS {
            let value = present(name).map(|v| {
                if name == "cdmFieldName" {
                    physical_field_name(v)
                } else {
                    v.to_lowercase()
                }
            });
            ctx.insert(name.into(), value.map(Value::String).unwrap_or(Value::Null));
        }
        for name in VERBATIM_PARAMS {
            ctx.insert(
                name.into(),
                present(name).map(Value::from).unwrap_or(Value::Null),
            );
        }
        ctx.insert(
            PLAUSIBLE_VALUE_HIGH.into(),
            present(PLAUSIBLE_VALUE_HIGH)
                .map(|v| Value::String(translate_plausible_value_high(v)))
                .unwrap_or(Value::Null),
        );

        Value::Object(ctx)
    }

    pub fn render(&self, instance: &CheckInstance) -> Result<String, DqdError> {
        let context = self.render_context(&instance.element);
        self.renderer.render(&instance.check.sql_file, &context)
    }
}

#[async_trait]
impl<T: TemplateEngine + 'static> QueryExecutor for SqlQueryExecutor<T> {
    #[instrument(skip_all, fields(row = %instance.provenance, sql_file = %instance.check.sql_file))]
    async fn execute(&self, instance: &CheckInstance, cancel: &CancellationToken) -> QueryRun {
        if cancel.is_cancelled() {
            return QueryRun::failed_before_execution(CANCELLED);
        }

        let sql = match self.render(instance) {
            Ok(sql) => sql,
            Err(e) => return QueryRun::failed_before_execution(e),
        };

        let start = Instant::now();
        // Losing the race drops the connector future, which stops the query
        // on the backend too.
        let outcome = tokio::select! {
            _ = cancel.cancelled() => ExecutionOutcome::Error(CANCELLED.to_string()),
            res = self.connector.query_violations(&sql, cancel) => match res {
                Ok(stats) => ExecutionOutcome::Success(stats),
                Err(_) if cancel.is_cancelled() => ExecutionOutcome::Error(CANCELLED.to_string()),
                Err(e) => ExecutionOutcome::Error(e.to_string()),
            },
        };
        let elapsed = start.elapsed();
        debug!("⚡ Check query finished in {:.2?}", elapsed);

        QueryRun {
            query_text: Some(sql),
            execution_time: Some(elapsed),
            outcome,
        }
    }
}
