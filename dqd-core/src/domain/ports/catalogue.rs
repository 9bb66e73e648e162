use crate::domain::catalogue::Catalogue;
use crate::error::DqdError;

/// Source of the four catalogue tables (descriptions + three target levels).
pub trait CatalogueLoader: Send + Sync {
    fn load(&self) -> Result<Catalogue, DqdError>;
}

/// Already-loaded catalogue, handy for tests and embedding.
impl CatalogueLoader for Catalogue {
    fn load(&self) -> Result<Catalogue, DqdError> {
        Ok(self.clone())
    }
}
