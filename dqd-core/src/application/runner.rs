// dqd-core/src/application/runner.rs

use futures::StreamExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::application::ports::QueryExecutor;
use crate::domain::catalogue::CheckDefinition;
use crate::domain::quality::{CheckInstance, CheckResult, QueryRun};

/// Error recorded on instances that never ran because the run was cancelled.
pub const CANCELLED: &str = "cancelled";

/// All instances of one check definition.
#[derive(Debug, Clone)]
pub struct CheckBatch {
    pub check: Arc<CheckDefinition>,
    pub instances: Vec<CheckInstance>,
}

impl CheckBatch {
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Runs the instances of one batch with bounded concurrency.
pub struct CheckRunner {
    executor: Arc<dyn QueryExecutor>,
    max_workers: usize,
}

impl CheckRunner {
    pub fn new(executor: Arc<dyn QueryExecutor>, max_workers: usize) -> Self {
        Self {
            executor,
            max_workers: max_workers.max(1),
        }
    }

    /// One result per instance, sorted by provenance id.
    ///
    /// Each instance runs on its own task; a failing or panicking instance
    /// only affects its own result.
    #[instrument(
        skip_all,
        fields(check = %batch.check.check_name, instances = batch.len(), workers = self.max_workers)
    )]
    pub async fn run(&self, batch: &CheckBatch, cancel: &CancellationToken) -> Vec<CheckResult> {
        let tasks = batch.instances.iter().cloned().map(|instance| {
            let executor = Arc::clone(&self.executor);
            let cancel = cancel.clone();

            async move {
                if cancel.is_cancelled() {
                    return CheckResult::from_run(&instance, QueryRun::failed_before_execution(CANCELLED));
                }

                let task_instance = instance.clone();
                let handle =
                    tokio::spawn(async move { executor.execute(&task_instance, &cancel).await });

                let run = match handle.await {
                    Ok(run) => run,
                    Err(e) => QueryRun::failed_before_execution(format!("check task failed: {}", e)),
                };
                CheckResult::from_run(&instance, run)
            }
        });

        let mut results: Vec<CheckResult> = futures::stream::iter(tasks)
            .buffer_unordered(self.max_workers)
            .collect()
            .await;

        results.sort_by_key(|r| r.row);

        for failed in results.iter().filter(|r| r.is_error()) {
            warn!(
                check_id = %failed.check_id,
                row = %failed.row,
                error = failed.error.as_deref().unwrap_or_default(),
                "Check instance failed to execute"
            );
        }
        debug!(
            failed = results.iter().filter(|r| r.failed).count(),
            "Batch finished"
        );

        results
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::domain::catalogue::{DataElement, ElementKey, TableElement};
    use crate::domain::quality::{ExecutionOutcome, ProvenanceId, ViolationStats};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Violations come from the table name: `FAIL_*` errors, `PANIC_*` panics,
    /// anything else reports `delay_ms` violated rows after sleeping that long.
    struct ScriptedExecutor {
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ScriptedExecutor {
        fn new() -> Self {
            Self {
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl QueryExecutor for ScriptedExecutor {
        async fn execute(&self, instance: &CheckInstance, cancel: &CancellationToken) -> QueryRun {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let table = instance.element.table_name().to_string();
            let delay = instance
                .element
                .attribute("delay_ms")
                .and_then(|d| d.parse::<u64>().ok())
                .unwrap_or(0);

            let outcome = tokio::select! {
                _ = cancel.cancelled() => ExecutionOutcome::Error(CANCELLED.into()),
                _ = tokio::time::sleep(Duration::from_millis(delay)) => {
                    if table.starts_with("PANIC") {
                        self.in_flight.fetch_sub(1, Ordering::SeqCst);
                        panic!("boom");
                    }
                    if table.starts_with("FAIL") {
                        ExecutionOutcome::Error(format!("Table {} does not exist", table))
                    } else {
                        ExecutionOutcome::Success(ViolationStats {
                            num_violated_rows: delay,
                            pct_violated_rows: 0.0,
                            num_denominator_rows: 100,
                        })
                    }
                }
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            QueryRun {
                query_text: Some(format!("SELECT * FROM {}", table)),
                execution_time: Some(Duration::from_millis(delay)),
                outcome,
            }
        }
    }

    fn batch(tables: &[(&str, u64)]) -> CheckBatch {
        let check = Arc::new(CheckDefinition {
            check_level: "TABLE".into(),
            check_name: "cdmTable".into(),
            check_description: String::new(),
            kahn_context: "Verification".into(),
            kahn_category: "Conformance".into(),
            kahn_subcategory: "Relational".into(),
            sql_file: "table_cdm_table.sql".into(),
            evaluation_filter: String::new(),
            severity: None,
        });
        let instances = tables
            .iter()
            .enumerate()
            .map(|(i, (name, delay))| CheckInstance {
                provenance: ProvenanceId::from_ordinals(0, i),
                check: Arc::clone(&check),
                element: Arc::new(DataElement::from(
                    TableElement::new(*name).with_attribute("delay_ms", &delay.to_string()),
                )),
            })
            .collect();
        CheckBatch { check, instances }
    }

    #[tokio::test]
    async fn test_results_sorted_despite_completion_order() {
        let tables: Vec<(String, u64)> = (0..12)
            .map(|i| (format!("T{}", i), 60 - (i as u64) * 5))
            .collect();
        let refs: Vec<(&str, u64)> = tables.iter().map(|(n, d)| (n.as_str(), *d)).collect();
        let runner = CheckRunner::new(Arc::new(ScriptedExecutor::new()), 16);

        let results = runner.run(&batch(&refs), &CancellationToken::new()).await;

        assert_eq!(results.len(), 12);
        let rows: Vec<String> = results.iter().map(|r| r.row.to_string()).collect();
        assert_eq!(rows[1], "1.2");
        assert_eq!(rows[9], "1.10");
        assert!(results.windows(2).all(|w| w[0].row < w[1].row));
    }

    #[tokio::test]
    async fn test_worker_budget_bounds_concurrency() {
        let executor = Arc::new(ScriptedExecutor::new());
        let runner = CheckRunner::new(executor.clone(), 3);
        let tables: Vec<(&str, u64)> = vec![("A", 20); 10];

        let results = runner.run(&batch(&tables), &CancellationToken::new()).await;

        assert_eq!(results.len(), 10);
        assert!(executor.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_error_is_isolated_to_its_instance() {
        let runner = CheckRunner::new(Arc::new(ScriptedExecutor::new()), 16);
        let results = runner
            .run(
                &batch(&[("PERSON", 0), ("FAIL_X", 0), ("VISIT", 2)]),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(results.len(), 3);
        assert!(!results[0].failed);
        assert!(results[1].failed);
        assert!(results[1].error.as_deref().unwrap().contains("FAIL_X"));
        assert_eq!(results[1].num_violated_rows, None);
        // 2 violated rows and no threshold: fails on the count
        assert!(results[2].failed);
        assert!(results[2].error.is_none());
    }

    #[tokio::test]
    async fn test_panicking_instance_becomes_an_error_result() {
        let runner = CheckRunner::new(Arc::new(ScriptedExecutor::new()), 4);
        let results = runner
            .run(
                &batch(&[("PERSON", 0), ("PANIC_NOW", 0), ("DEATH", 0)]),
                &CancellationToken::new(),
            )
            .await;

        assert_eq!(results.len(), 3);
        assert!(results[1].failed);
        assert!(
            results[1]
                .error
                .as_deref()
                .unwrap()
                .starts_with("check task failed")
        );
        assert!(!results[0].failed);
        assert!(!results[2].failed);
    }

    #[tokio::test]
    async fn test_cancelled_run_still_yields_every_result() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let runner = CheckRunner::new(Arc::new(ScriptedExecutor::new()), 2);

        let results = runner
            .run(&batch(&[("PERSON", 500), ("VISIT", 500), ("DEATH", 500)]), &cancel)
            .await;

        assert_eq!(results.len(), 3);
        assert!(
            results
                .iter()
                .all(|r| r.failed && r.error.as_deref() == Some(CANCELLED))
        );
    }
}
