// dqd-core/src/domain/quality/threshold.rs

use tracing::debug;

use super::result::{ExecutionOutcome, ViolationStats};
use crate::domain::catalogue::DataElement;

/// Threshold-derived fields of a check result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ThresholdDecision {
    pub failed: bool,
    pub threshold_value: Option<f64>,
    pub notes_value: Option<String>,
}

/// Which rule decided the outcome. Selected only by the presence of a
/// usable, nonzero threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdPolicy {
    /// Any violated row fails the check.
    AbsoluteCount,
    /// Fails when the violated percentage exceeds the threshold.
    Percentage(f64),
}

pub struct ThresholdEvaluator;

impl ThresholdEvaluator {
    pub fn evaluate(
        check_name: &str,
        element: &DataElement,
        outcome: &ExecutionOutcome,
    ) -> ThresholdDecision {
        let stats = match outcome {
            ExecutionOutcome::Error(_) => {
                return ThresholdDecision {
                    failed: true,
                    ..Default::default()
                };
            }
            ExecutionOutcome::Success(stats) => stats,
        };

        let mut decision = ThresholdDecision::default();
        if let Some(configured) = element.attributes().threshold_for(check_name) {
            let raw = configured.threshold.as_deref().unwrap_or_default();
            decision.threshold_value = Some(Self::parse_threshold(check_name, raw));
            decision.notes_value = configured.notes.clone();
        }

        decision.failed = Self::policy(decision.threshold_value).fails(stats);
        decision
    }

    pub fn policy(threshold_value: Option<f64>) -> ThresholdPolicy {
        match threshold_value {
            Some(t) if t != 0.0 => ThresholdPolicy::Percentage(t),
            _ => ThresholdPolicy::AbsoluteCount,
        }
    }

    /// Unparsable, empty or non-finite (`nan`, `inf`) thresholds fall back
    /// to the strict policy.
    fn parse_threshold(check_name: &str, raw: &str) -> f64 {
        match raw.trim().parse::<f64>().ok().filter(|v| v.is_finite()) {
            Some(value) => value,
            None => {
                if !raw.trim().is_empty() {
                    debug!(check = check_name, raw, "Non-numeric threshold, using 0");
                }
                0.0
            }
        }
    }
}

impl ThresholdPolicy {
    pub fn fails(&self, stats: &ViolationStats) -> bool {
        match self {
            ThresholdPolicy::AbsoluteCount => stats.num_violated_rows > 0,
            ThresholdPolicy::Percentage(threshold) => stats.pct_violated_rows * 100.0 > *threshold,
        }
    }
}
