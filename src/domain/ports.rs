use crate::domain::model::{Product, ProductId};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Ordered source of identifiers, consumed with skip/take semantics so a
/// resumed run can page past identifiers it has already completed.
#[async_trait]
pub trait IdSource: Send + Sync {
    async fn load(&self, offset: usize, limit: usize) -> Result<Vec<ProductId>>;
}

/// Maps a raw API payload to the persisted record shape. Pure; the engine
/// treats the output opaquely except for the identifier.
pub trait Extractor: Send + Sync {
    fn extract(&self, payload: &serde_json::Value) -> Option<Product>;
}
