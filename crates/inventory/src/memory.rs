use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use common::ProductId;
use tokio::sync::RwLock;

use crate::Result;
use crate::error::InventoryError;
use crate::product::Product;
use crate::store::ProductStore;

/// In-memory product store for testing and single-node runs.
///
/// Provides the same interface as the PostgreSQL implementation. The
/// guarded decrement holds the write lock across the check and the
/// mutation, which is what makes it atomic per store.
#[derive(Clone, Default)]
pub struct InMemoryProductStore {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryProductStore {
    /// Creates a new empty in-memory product store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of products stored.
    pub async fn count(&self) -> usize {
        self.products.read().await.len()
    }
}

#[async_trait]
impl ProductStore for InMemoryProductStore {
    async fn insert(&self, product: &Product) -> Result<()> {
        let mut products = self.products.write().await;
        products.insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn get(&self, id: &ProductId) -> Result<Option<Product>> {
        let products = self.products.read().await;
        Ok(products.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut all: Vec<_> = products.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(all)
    }

    async fn update(&self, product: &Product) -> Result<()> {
        let mut products = self.products.write().await;
        match products.get_mut(&product.id) {
            Some(existing) => {
                *existing = product.clone();
                Ok(())
            }
            None => Err(InventoryError::ProductNotFound(product.id.clone())),
        }
    }

    async fn delete(&self, id: &ProductId) -> Result<()> {
        let mut products = self.products.write().await;
        products
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| InventoryError::ProductNotFound(id.clone()))
    }

    async fn search_by_name(&self, fragment: &str) -> Result<Vec<Product>> {
        let needle = fragment.to_lowercase();
        let products = self.products.read().await;
        let mut found: Vec<_> = products
            .values()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(found)
    }

    async fn in_stock(&self) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut found: Vec<_> = products
            .values()
            .filter(|p| p.stock_quantity > 0)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(found)
    }

    async fn low_stock(&self, threshold: u32) -> Result<Vec<Product>> {
        let products = self.products.read().await;
        let mut found: Vec<_> = products
            .values()
            .filter(|p| p.stock_quantity <= threshold)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.stock_quantity.cmp(&b.stock_quantity));
        Ok(found)
    }

    async fn decrement_stock(&self, id: &ProductId, quantity: u32) -> Result<u32> {
        let mut products = self.products.write().await;
        let product = products
            .get_mut(id)
            .ok_or_else(|| InventoryError::ProductNotFound(id.clone()))?;

        if product.stock_quantity < quantity {
            return Err(InventoryError::InsufficientStock {
                product_id: id.clone(),
                requested: quantity,
                available: product.stock_quantity,
            });
        }

        product.stock_quantity -= quantity;
        product.updated_at = Utc::now();
        Ok(product.stock_quantity)
    }
}
