//! In-memory product catalog.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::catalog::ProductSnapshot;
use crate::domain::foundation::{DomainError, ProductId};
use crate::ports::ProductCatalog;

/// In-memory catalog of product snapshots.
#[derive(Default)]
pub struct InMemoryCatalog {
    products: RwLock<HashMap<ProductId, ProductSnapshot>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a product.
    pub async fn insert(&self, snapshot: ProductSnapshot) {
        self.products.write().await.insert(snapshot.id, snapshot);
    }

    /// Removes a product, simulating catalog deletion.
    pub async fn remove(&self, id: &ProductId) {
        self.products.write().await.remove(id);
    }
}

#[async_trait]
impl ProductCatalog for InMemoryCatalog {
    async fn snapshot(&self, id: &ProductId) -> Result<Option<ProductSnapshot>, DomainError> {
        Ok(self.products.read().await.get(id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Money;
    use rust_decimal_macros::dec;

    fn snapshot(id: ProductId) -> ProductSnapshot {
        ProductSnapshot {
            id,
            title: "Avocado Crate".to_string(),
            unit_price: Money::new(dec!(15.00)),
            stock: 5,
            image_url: None,
            vendor: None,
        }
    }

    #[tokio::test]
    async fn snapshot_returns_none_for_missing_product() {
        let catalog = InMemoryCatalog::new();
        assert!(catalog.snapshot(&ProductId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn snapshots_skips_removed_products() {
        let catalog = InMemoryCatalog::new();
        let kept = ProductId::new();
        let removed = ProductId::new();
        catalog.insert(snapshot(kept)).await;
        catalog.insert(snapshot(removed)).await;
        catalog.remove(&removed).await;

        let map = catalog.snapshots(&[kept, removed]).await.unwrap();
        assert!(map.contains_key(&kept));
        assert!(!map.contains_key(&removed));
    }
}
