// dqd-core/src/domain/quality/summary.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use super::result::CheckResult;
use crate::domain::error::DomainError;

pub const PLAUSIBILITY: &str = "Plausibility";
pub const CONFORMANCE: &str = "Conformance";
pub const COMPLETENESS: &str = "Completeness";

/// One row of source metadata (e.g. the `cdm_source` table), keys upper-cased.
pub type SourceMetadata = BTreeMap<String, serde_json::Value>;

/// Aggregate counts of a run. Always recomputable from the check results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub count_total: usize,
    pub count_threshold_failed: usize,
    pub count_error_failed: usize,
    pub count_overall_failed: usize,
    pub count_passed: usize,
    pub percent_passed: i64,
    pub percent_failed: i64,
    pub count_total_plausibility: usize,
    pub count_total_conformance: usize,
    pub count_total_completeness: usize,
    pub count_failed_plausibility: usize,
    pub count_failed_conformance: usize,
    pub count_failed_completeness: usize,
    pub count_passed_plausibility: usize,
    pub count_passed_conformance: usize,
    pub count_passed_completeness: usize,
}

#[derive(Debug, Default)]
struct Tally {
    total: usize,
    threshold_failed: usize,
    error_failed: usize,
    overall_failed: usize,
    // [plausibility, conformance, completeness]
    category_total: [usize; 3],
    category_failed: [usize; 3],
}

impl Tally {
    fn add(mut self, result: &CheckResult) -> Self {
        self.total += 1;
        if result.failed && !result.is_error() {
            self.threshold_failed += 1;
        }
        if result.is_error() {
            self.error_failed += 1;
        }
        if result.failed {
            self.overall_failed += 1;
        }

        let slot = match result.category.as_str() {
            PLAUSIBILITY => Some(0),
            CONFORMANCE => Some(1),
            COMPLETENESS => Some(2),
            _ => None,
        };
        if let Some(i) = slot {
            self.category_total[i] += 1;
            if result.failed {
                self.category_failed[i] += 1;
            }
        }
        self
    }
}

impl Overview {
    /// Pure fold over the results; the order of `results` is irrelevant.
    /// An empty set is an error rather than a silent 0%.
    pub fn aggregate<'a, I>(results: I) -> Result<Self, DomainError>
    where
        I: IntoIterator<Item = &'a CheckResult>,
    {
        let tally = results.into_iter().fold(Tally::default(), Tally::add);
        if tally.total == 0 {
            return Err(DomainError::NoCheckResults);
        }

        let count_passed = tally.total - tally.overall_failed;
        let [total_p, total_cf, total_cp] = tally.category_total;
        let [failed_p, failed_cf, failed_cp] = tally.category_failed;

        Ok(Self {
            count_total: tally.total,
            count_threshold_failed: tally.threshold_failed,
            count_error_failed: tally.error_failed,
            count_overall_failed: tally.overall_failed,
            count_passed,
            percent_passed: percent(count_passed, tally.total),
            percent_failed: percent(tally.overall_failed, tally.total),
            count_total_plausibility: total_p,
            count_total_conformance: total_cf,
            count_total_completeness: total_cp,
            count_failed_plausibility: failed_p,
            count_failed_conformance: failed_cf,
            count_failed_completeness: failed_cp,
            count_passed_plausibility: total_p - failed_p,
            count_passed_conformance: total_cf - failed_cf,
            count_passed_completeness: total_cp - failed_cp,
        })
    }
}

// Half-way values round to even, like the report has always done.
fn percent(part: usize, total: usize) -> i64 {
    ((part as f64 / total as f64) * 100.0).round_ties_even() as i64
}

/// The run-level report.
#[derive(Debug, Clone, Serialize)]
pub struct CheckSummary {
    #[serde(rename = "startTimestamp")]
    pub start_timestamp: DateTime<Utc>,
    #[serde(rename = "endTimestamp")]
    pub end_timestamp: DateTime<Utc>,
    #[serde(rename = "executionTime")]
    pub execution_time: String,
    #[serde(rename = "Overview")]
    pub overview: Overview,
    #[serde(rename = "Metadata")]
    pub metadata: Vec<SourceMetadata>,
    #[serde(rename = "CheckResults")]
    pub check_results: Vec<CheckResult>,
}

impl CheckSummary {
    pub fn cdm_source_abbreviation(&self) -> Option<&str> {
        self.metadata
            .first()
            .and_then(|m| m.get("CDM_SOURCE_ABBREVIATION"))
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }
}

// (seconds per unit, singular, plural), largest first
const TIME_UNITS: [(f64, &str, &str); 6] = [
    (31_449_600.0, "year", "years"),
    (604_800.0, "week", "weeks"),
    (86_400.0, "day", "days"),
    (3_600.0, "hour", "hours"),
    (60.0, "minute", "minutes"),
    (1.0, "second", "seconds"),
];

const MAX_TIMESPAN_UNITS: usize = 3;

/// Human-readable elapsed time: "3.25 seconds", "2 minutes and 5.5 seconds",
/// "1 day, 2 hours and 3 minutes". Seconds keep two decimals; at most three
/// units are shown.
pub fn format_timespan(elapsed: Duration) -> String {
    let total = elapsed.as_secs_f64();
    if total < 60.0 {
        return pluralize(round_number(total), "second", "seconds");
    }

    let mut remaining = total;
    let mut parts = Vec::new();
    for (i, (divider, singular, plural)) in TIME_UNITS.iter().enumerate() {
        let count = remaining / divider;
        remaining %= divider;
        let count = if i == TIME_UNITS.len() - 1 {
            round_number(count)
        } else {
            (count.floor() as u64).to_string()
        };
        if count != "0" {
            parts.push(pluralize(count, singular, plural));
        }
    }
    parts.truncate(MAX_TIMESPAN_UNITS);

    match parts.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} and {}", rest.join(", "), last),
        Some((last, _)) => last.clone(),
        None => "0 seconds".to_string(),
    }
}

// Two decimals, trailing zeros dropped.
fn round_number(value: f64) -> String {
    format!("{:.2}", value)
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_string()
}

fn pluralize(count: String, singular: &str, plural: &str) -> String {
    if count == "1" {
        format!("1 {}", singular)
    } else {
        format!("{} {}", count, plural)
    }
}
