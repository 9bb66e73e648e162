// dqd/src/commands/run.rs
//
// USE CASE: Run every data quality check and write the report.

use anyhow::Context;
use comfy_table::{Table, presets::UTF8_FULL};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use dqd_core::application::{CdmSourceMetadata, DataQualityEngine, SqlQueryExecutor};
use dqd_core::domain::quality::CheckSummary;
use dqd_core::infrastructure::adapters::duckdb::DuckDBConnector;
use dqd_core::infrastructure::compiler::jinja::JinjaRenderer;
use dqd_core::infrastructure::config::catalogue_loader;
use dqd_core::infrastructure::report::write_summary;
use dqd_core::ports::connector::Connector;

use super::{exit_with, load_config, resolve};

pub struct RunOptions {
    pub project_dir: PathBuf,
    pub max_workers: Option<usize>,
    pub exclude: Vec<String>,
    pub output: Option<PathBuf>,
}

pub async fn execute(opts: RunOptions) -> anyhow::Result<()> {
    let start = std::time::Instant::now();
    let project_dir = opts.project_dir;

    // A. Load the Config (Infra)
    println!("⚙️  Loading configuration...");
    let mut config = load_config(&project_dir, opts.exclude)?;
    if let Some(workers) = opts.max_workers {
        config.engine.max_workers = workers;
    }
    println!("   Project: {} (v{})", config.name, config.version);

    // B. Instantiate the DB Adapter (DuckDB)
    let db_path = if config.database == ":memory:" {
        config.database.clone()
    } else {
        resolve(&project_dir, &config.database)
            .to_string_lossy()
            .into_owned()
    };
    let connector: Arc<dyn Connector> = Arc::new(
        DuckDBConnector::new(&db_path)
            .with_context(|| format!("Failed to open DuckDB at {}", db_path))?,
    );
    println!("   Engine: {} 🦆 ({})", connector.engine_name(), db_path);

    // C. Wire the engine (dependency injection)
    let renderer = Arc::new(JinjaRenderer::from_dir(resolve(
        &project_dir,
        &config.template_path,
    )));
    let executor = Arc::new(SqlQueryExecutor::new(
        Arc::clone(&connector),
        renderer,
        config.cdm_schema.clone(),
    ));
    let engine = DataQualityEngine::new(executor, config.engine.clone()).with_metadata(Arc::new(
        CdmSourceMetadata::new(Arc::clone(&connector), config.cdm_schema.clone()),
    ));
    let loader = catalogue_loader(&project_dir, &config.catalogue_path);

    // Ctrl-C: unfinished checks are recorded as cancelled, the report is still written
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling remaining checks");
            on_signal.cancel();
        }
    });

    println!("🟢 Running checks (max {} workers)...", config.engine.max_workers);
    let summary = match engine.run(&loader, &cancel).await {
        Ok(summary) => summary,
        Err(e) => exit_with("DATA QUALITY RUN FAILED", e),
    };

    print_overview(&summary);

    // D. Persist the report
    let output_dir = opts
        .output
        .unwrap_or_else(|| resolve(&project_dir, &config.output_path));
    let path = write_summary(&summary, &output_dir)
        .with_context(|| format!("Failed to write report into {:?}", output_dir))?;
    println!("💾 Report saved to {}", path.display());

    println!(
        "\n✨ Done in {:.2?}. {} checks, {} failed.",
        start.elapsed(),
        summary.overview.count_total,
        summary.overview.count_overall_failed
    );

    Ok(())
}

fn print_overview(summary: &CheckSummary) {
    let o = &summary.overview;
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Category", "Total", "Passed", "Failed"]);
    table.add_row(vec![
        "Plausibility".to_string(),
        o.count_total_plausibility.to_string(),
        o.count_passed_plausibility.to_string(),
        o.count_failed_plausibility.to_string(),
    ]);
    table.add_row(vec![
        "Conformance".to_string(),
        o.count_total_conformance.to_string(),
        o.count_passed_conformance.to_string(),
        o.count_failed_conformance.to_string(),
    ]);
    table.add_row(vec![
        "Completeness".to_string(),
        o.count_total_completeness.to_string(),
        o.count_passed_completeness.to_string(),
        o.count_failed_completeness.to_string(),
    ]);
    table.add_row(vec![
        "Total".to_string(),
        o.count_total.to_string(),
        format!("{} ({}%)", o.count_passed, o.percent_passed),
        format!("{} ({}%)", o.count_overall_failed, o.percent_failed),
    ]);

    println!("\n📊 Overview ({})", summary.execution_time);
    println!("{table}");

    if o.count_error_failed > 0 {
        eprintln!("⚠️  {} check(s) could not be executed:", o.count_error_failed);
        for failed in summary.check_results.iter().filter(|r| r.is_error()) {
            eprintln!(
                "   ❌ [{}] {}: {}",
                failed.row,
                failed.check_id,
                failed.error.as_deref().unwrap_or_default()
            );
        }
    }
}
