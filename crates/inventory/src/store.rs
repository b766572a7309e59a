//! Storage trait for products.

use async_trait::async_trait;
use common::ProductId;

use crate::Result;
use crate::product::Product;

/// Durable keyed store for products.
///
/// `decrement_stock` is the atomicity primitive the reservation engine is
/// built on: implementations must make the stock guard and the decrement a
/// single indivisible step per product, so two concurrent reducers can never
/// both pass the guard and jointly overdraw the counter.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Inserts a new product.
    async fn insert(&self, product: &Product) -> Result<()>;

    /// Fetches a product by id. Returns `None` on a miss.
    async fn get(&self, id: &ProductId) -> Result<Option<Product>>;

    /// Lists all products.
    async fn list(&self) -> Result<Vec<Product>>;

    /// Replaces an existing product. Fails with `ProductNotFound` on a miss.
    async fn update(&self, product: &Product) -> Result<()>;

    /// Deletes a product. Fails with `ProductNotFound` on a miss.
    async fn delete(&self, id: &ProductId) -> Result<()>;

    /// Products whose name contains the fragment, case-insensitively.
    async fn search_by_name(&self, fragment: &str) -> Result<Vec<Product>>;

    /// Products with stock strictly above zero.
    async fn in_stock(&self) -> Result<Vec<Product>>;

    /// Products with stock at or below the threshold.
    async fn low_stock(&self, threshold: u32) -> Result<Vec<Product>>;

    /// Atomically decrements stock by `quantity` iff enough is available.
    ///
    /// Returns the new stock level on success. Fails with `ProductNotFound`
    /// if the id does not exist and `InsufficientStock` (carrying the
    /// observed available count) if the guard rejects the decrement.
    async fn decrement_stock(&self, id: &ProductId, quantity: u32) -> Result<u32>;
}
