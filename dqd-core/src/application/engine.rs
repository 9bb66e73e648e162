// dqd-core/src/application/engine.rs

use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::application::metadata::capture_metadata;
use crate::application::ports::{MetadataSource, QueryExecutor};
use crate::application::runner::{CheckBatch, CheckRunner};
use crate::application::selection::ElementFilter;
use crate::domain::catalogue::Catalogue;
use crate::domain::error::DomainError;
use crate::domain::ports::CatalogueLoader;
use crate::domain::project::EngineConfig;
use crate::domain::quality::{CheckInstance, CheckResult, CheckSummary, Overview, ProvenanceId, format_timespan};
use crate::error::DqdError;

/// Lifecycle of one engine run. States only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RunState {
    Init,
    CatalogueLoaded,
    Expanding,
    Running,
    Aggregating,
    Reported,
    Done,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Init => "init",
            RunState::CatalogueLoaded => "catalogue_loaded",
            RunState::Expanding => "expanding",
            RunState::Running => "running",
            RunState::Aggregating => "aggregating",
            RunState::Reported => "reported",
            RunState::Done => "done",
        };
        f.write_str(name)
    }
}

impl RunState {
    fn advance(&mut self, next: RunState) {
        debug_assert!(next > *self, "run state went backwards: {} -> {}", self, next);
        debug!(from = %self, to = %next, "Run state transition");
        *self = next;
    }
}

/// Expands every check definition into its instances.
///
/// Batches keep the order of the check descriptions, instance ordinals the
/// order of the filtered elements. Any catalogue-integrity error aborts the
/// whole expansion.
pub fn expand(catalogue: &Catalogue, config: &EngineConfig) -> Result<Vec<CheckBatch>, DomainError> {
    let filter = ElementFilter::new(&config.tables_to_exclude);
    let eligible = filter.eligible(catalogue);

    catalogue
        .checks
        .iter()
        .enumerate()
        .map(|(check_ordinal, definition)| {
            let elements = filter.select(definition, &eligible)?;
            let check = Arc::new(definition.clone());
            let instances = elements
                .into_iter()
                .enumerate()
                .map(|(element_ordinal, element)| CheckInstance {
                    provenance: ProvenanceId::from_ordinals(check_ordinal, element_ordinal),
                    check: Arc::clone(&check),
                    element,
                })
                .collect();
            Ok(CheckBatch { check, instances })
        })
        .collect()
}

/// Runs a check catalogue against one backend and builds the summary report.
pub struct DataQualityEngine {
    runner: CheckRunner,
    metadata: Option<Arc<dyn MetadataSource>>,
    config: EngineConfig,
}

impl DataQualityEngine {
    pub fn new(executor: Arc<dyn QueryExecutor>, config: EngineConfig) -> Self {
        Self {
            runner: CheckRunner::new(executor, config.max_workers),
            metadata: None,
            config,
        }
    }

    pub fn with_metadata(mut self, source: Arc<dyn MetadataSource>) -> Self {
        self.metadata = Some(source);
        self
    }

    /// Loads the catalogue and evaluates it.
    #[instrument(skip_all)]
    pub async fn run(
        &self,
        loader: &dyn CatalogueLoader,
        cancel: &CancellationToken,
    ) -> Result<CheckSummary, DqdError> {
        let started_at = Utc::now();
        let clock = Instant::now();
        let mut state = RunState::Init;

        let catalogue = loader.load()?;
        state.advance(RunState::CatalogueLoaded);
        info!(
            checks = catalogue.checks.len(),
            elements = catalogue.element_count(),
            "📦 Catalogue loaded"
        );

        state.advance(RunState::Expanding);
        let batches = expand(&catalogue, &self.config)?;
        let planned: usize = batches.iter().map(CheckBatch::len).sum();
        info!(
            batches = batches.len(),
            instances = planned,
            "📝 Check instances expanded"
        );

        state.advance(RunState::Running);
        let mut results: Vec<CheckResult> = Vec::with_capacity(planned);
        for batch in batches.iter().filter(|b| !b.is_empty()) {
            let batch_results = self.runner.run(batch, cancel).await;
            info!(
                check = %batch.check.check_name,
                instances = batch_results.len(),
                failed = batch_results.iter().filter(|r| r.failed).count(),
                "🔹 Check finished"
            );
            results.extend(batch_results);
        }
        if cancel.is_cancelled() {
            info!("Run cancelled, unfinished instances were recorded as errors");
        }

        state.advance(RunState::Aggregating);
        let overview = Overview::aggregate(&results)?;
        let metadata = match &self.metadata {
            Some(source) => capture_metadata(source.as_ref(), &self.config.dqd_version).await,
            None => Vec::new(),
        };

        state.advance(RunState::Reported);
        let summary = CheckSummary {
            start_timestamp: started_at,
            end_timestamp: Utc::now(),
            execution_time: format_timespan(clock.elapsed()),
            overview,
            metadata,
            check_results: results,
        };
        info!(
            total = summary.overview.count_total,
            failed = summary.overview.count_overall_failed,
            errors = summary.overview.count_error_failed,
            elapsed = %summary.execution_time,
            "✨ Data quality run complete"
        );

        state.advance(RunState::Done);
        Ok(summary)
    }

    /// Evaluates an already-loaded catalogue.
    pub async fn evaluate(
        &self,
        catalogue: &Catalogue,
        cancel: &CancellationToken,
    ) -> Result<CheckSummary, DqdError> {
        self.run(catalogue, cancel).await
    }
}
