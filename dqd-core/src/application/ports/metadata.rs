use async_trait::async_trait;

use crate::domain::quality::SourceMetadata;
use crate::error::DqdError;

/// Descriptive rows about the dataset being checked (e.g. `cdm_source`).
#[async_trait]
pub trait MetadataSource: Send + Sync {
    async fn source_metadata(&self) -> Result<Vec<SourceMetadata>, DqdError>;
}
