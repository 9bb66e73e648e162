// dqd-core/src/domain/quality/mod.rs

pub mod instance;
pub mod result;
pub mod summary;
pub mod threshold;

pub use instance::{CheckInstance, ProvenanceId, check_id};
pub use result::{CheckResult, ExecutionOutcome, QueryRun, ViolationStats};
pub use summary::{CheckSummary, Overview, SourceMetadata, format_timespan};
pub use threshold::{ThresholdDecision, ThresholdEvaluator, ThresholdPolicy};
