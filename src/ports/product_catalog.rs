//! ProductCatalog port - read-only access to the product collaborator.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::catalog::ProductSnapshot;
use crate::domain::foundation::{DomainError, ProductId};

/// Port for reading product snapshots.
///
/// The catalog is owned by an external collaborator; this port never
/// mutates it. A missing product is a normal answer (`None`), not an
/// error: products can be deleted while carts still reference them.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Point-in-time snapshot of one product.
    async fn snapshot(&self, id: &ProductId) -> Result<Option<ProductSnapshot>, DomainError>;

    /// Snapshots for a set of products. Missing products are simply absent
    /// from the result map.
    async fn snapshots(
        &self,
        ids: &[ProductId],
    ) -> Result<HashMap<ProductId, ProductSnapshot>, DomainError> {
        let mut map = HashMap::with_capacity(ids.len());
        for id in ids {
            if let Some(snapshot) = self.snapshot(id).await? {
                map.insert(*id, snapshot);
            }
        }
        Ok(map)
    }
}
