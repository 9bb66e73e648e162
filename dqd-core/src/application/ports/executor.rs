use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::quality::{CheckInstance, QueryRun};

/// Turns one check instance into violation statistics.
///
/// Failures never escape: they come back inside [`QueryRun::outcome`] so a
/// broken instance cannot take its siblings down.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, instance: &CheckInstance, cancel: &CancellationToken) -> QueryRun;
}
