// dqd-core/src/infrastructure/report.rs

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::domain::quality::CheckSummary;
use crate::infrastructure::error::InfrastructureError;
use crate::infrastructure::fs::atomic_write;

const DEFAULT_PREFIX: &str = "cdm";

/// `{cdm_source_abbreviation|cdm}-{endTimestamp}.json`, timestamp in a
/// filesystem-safe form.
pub fn report_file_name(summary: &CheckSummary) -> String {
    let prefix = summary
        .cdm_source_abbreviation()
        .map(|abbr| abbr.to_lowercase().replace(['/', '\\', ' '], "_"))
        .unwrap_or_else(|| DEFAULT_PREFIX.to_string());
    format!(
        "{}-{}.json",
        prefix,
        summary.end_timestamp.format("%Y%m%dT%H%M%S")
    )
}

/// The summary as JSON: four-space indent, object keys sorted.
pub fn render_summary(summary: &CheckSummary) -> Result<String, InfrastructureError> {
    // Going through Value sorts the keys (serde_json maps are ordered).
    let value = serde_json::to_value(summary)?;

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value.serialize(&mut ser)?;

    String::from_utf8(buf).map_err(|e| InfrastructureError::ConfigError(e.to_string()))
}

/// Writes the report into `output_dir` (created if needed) and returns its path.
#[instrument(skip(summary))]
pub fn write_summary(summary: &CheckSummary, output_dir: &Path) -> Result<PathBuf, InfrastructureError> {
    if !output_dir.exists() {
        fs::create_dir_all(output_dir)?;
    }
    let path = output_dir.join(report_file_name(summary));
    atomic_write(&path, render_summary(summary)?)?;
    info!(path = %path.display(), "💾 Report written");
    Ok(path)
}
