// dqd-core/src/domain/quality/result.rs

use serde::{Serialize, Serializer};
use std::time::Duration;

use super::instance::{CheckInstance, ProvenanceId};
use super::threshold::ThresholdEvaluator;
use crate::domain::catalogue::ElementKey;

/// Raw statistics returned by a check query.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ViolationStats {
    pub num_violated_rows: u64,
    pub pct_violated_rows: f64,
    pub num_denominator_rows: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Success(ViolationStats),
    Error(String),
}

impl ExecutionOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, ExecutionOutcome::Error(_))
    }
}

/// What the query executor reports for one instance.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRun {
    /// Rendered query, when rendering got that far.
    pub query_text: Option<String>,
    /// Time spent in the backend, when the query was sent.
    pub execution_time: Option<Duration>,
    pub outcome: ExecutionOutcome,
}

impl QueryRun {
    pub fn failed_before_execution(error: impl ToString) -> Self {
        Self {
            query_text: None,
            execution_time: None,
            outcome: ExecutionOutcome::Error(error.to_string()),
        }
    }
}

/// Flattened record for one check instance, as it appears in the report.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct CheckResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_violated_rows: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pct_violated_rows: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_denominator_rows: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_text: Option<String>,
    pub check_name: String,
    pub check_level: String,
    pub check_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdm_table_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cdm_field_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concept_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_concept_id: Option<String>,
    pub sql_file: String,
    pub category: String,
    pub subcategory: String,
    pub context: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(rename = "checkId")]
    pub check_id: String,
    #[serde(rename = "_row")]
    pub row: ProvenanceId,
    #[serde(serialize_with = "serialize_flag")]
    pub failed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threshold_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes_value: Option<String>,
}

impl CheckResult {
    /// Folds an executor run through the threshold evaluator.
    pub fn from_run(instance: &CheckInstance, run: QueryRun) -> Self {
        let check = instance.check.as_ref();
        let element = instance.element.as_ref();
        let decision = ThresholdEvaluator::evaluate(&check.check_name, element, &run.outcome);

        let (stats, error) = match run.outcome {
            ExecutionOutcome::Success(stats) => (Some(stats), None),
            ExecutionOutcome::Error(e) => (None, Some(e)),
        };

        Self {
            num_violated_rows: stats.map(|s| s.num_violated_rows),
            pct_violated_rows: stats.map(|s| round4(s.pct_violated_rows)),
            num_denominator_rows: stats.map(|s| s.num_denominator_rows),
            execution_time: run
                .execution_time
                .map(|d| format!("{:.6} secs", d.as_secs_f64())),
            query_text: run.query_text,
            check_name: check.check_name.clone(),
            check_level: check.check_level.clone(),
            check_description: check.check_description.clone(),
            cdm_table_name: Some(element.table_name().to_string()),
            cdm_field_name: element.field_name().map(str::to_string),
            concept_id: element.concept_id().map(str::to_string),
            unit_concept_id: element.unit_concept_id().map(str::to_string),
            sql_file: check.sql_file.clone(),
            category: check.kahn_category.clone(),
            subcategory: check.kahn_subcategory.clone(),
            context: check.kahn_context.clone(),
            severity: check.severity.clone().filter(|s| !s.is_empty()),
            error,
            check_id: instance.check_id(),
            row: instance.provenance,
            failed: decision.failed,
            threshold_value: decision.threshold_value,
            notes_value: decision.notes_value,
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn serialize_flag<S: Serializer>(flag: &bool, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u8(u8::from(*flag))
}
