//! The remote inventory boundary as seen from the order side.
//!
//! Every call crosses a process boundary and can fail independently of
//! local health. Implementations translate transport outcomes into the
//! [`ClientError`] taxonomy and apply no retries; retry policy belongs to
//! the call-site. The caller's identity travels with each call so the
//! order side always acts as the authenticated user, never with elevated
//! privilege.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use common::{Caller, Money, ProductId};
use thiserror::Error;

/// The product fields the orchestrator snapshots at order time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInfo {
    pub id: ProductId,
    pub name: String,
    pub unit_price: Money,
}

/// Domain-meaningful outcomes of a remote inventory call.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The remote reported no such product.
    #[error("Product not available: {0}")]
    ProductUnavailable(ProductId),

    /// The remote rejected a reduction for lack of stock.
    #[error("Insufficient stock for product {product_id}: requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: Option<u32>,
    },

    /// The remote rejected the propagated credentials.
    #[error("Access denied by inventory service")]
    AccessDenied,

    /// Timeout, connection failure, or the remote signalled unavailability.
    #[error("Inventory service unavailable: {0}")]
    Unavailable(String),

    /// Any response outside the mapped taxonomy.
    #[error("Unexpected inventory service response: {0}")]
    Unexpected(String),
}

/// Typed boundary to the inventory service.
#[async_trait]
pub trait InventoryClient: Send + Sync {
    /// Fetches the product fields needed for an order-time snapshot.
    async fn get_product(
        &self,
        caller: &Caller,
        product_id: &ProductId,
    ) -> Result<ProductInfo, ClientError>;

    /// Asks whether at least `quantity` units are currently available.
    async fn check_availability(
        &self,
        caller: &Caller,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<bool, ClientError>;

    /// Asks the remote to perform its guarded stock decrement.
    async fn reduce_stock(
        &self,
        caller: &Caller,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), ClientError>;
}

#[derive(Debug, Default)]
struct InMemoryInventoryState {
    products: HashMap<ProductId, ProductInfo>,
    stock: HashMap<ProductId, u32>,
    reductions: Vec<(ProductId, u32)>,
    fail_on_get: bool,
    fail_on_check: bool,
    fail_on_reduce: bool,
    fail_reduce_for: Vec<ProductId>,
}

/// In-memory inventory client for testing.
///
/// Backed by a scripted product map with per-operation failure toggles, and
/// records every reduction it is asked to perform.
#[derive(Debug, Clone, Default)]
pub struct InMemoryInventoryClient {
    state: Arc<RwLock<InMemoryInventoryState>>,
}

impl InMemoryInventoryClient {
    /// Creates an empty in-memory inventory client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a product with the given stock level.
    pub fn add_product(&self, info: ProductInfo, stock: u32) {
        let mut state = self.state.write().unwrap();
        state.stock.insert(info.id.clone(), stock);
        state.products.insert(info.id.clone(), info);
    }

    /// Configures product fetches to fail with a transport error.
    pub fn set_fail_on_get(&self, fail: bool) {
        self.state.write().unwrap().fail_on_get = fail;
    }

    /// Configures availability checks to fail with a transport error.
    pub fn set_fail_on_check(&self, fail: bool) {
        self.state.write().unwrap().fail_on_check = fail;
    }

    /// Configures stock reductions to fail with a transport error.
    pub fn set_fail_on_reduce(&self, fail: bool) {
        self.state.write().unwrap().fail_on_reduce = fail;
    }

    /// Configures reductions of one specific product to fail, leaving
    /// other products untouched.
    pub fn set_fail_reduce_for(&self, product_id: ProductId) {
        self.state.write().unwrap().fail_reduce_for.push(product_id);
    }

    /// Returns the remaining stock for a product.
    pub fn stock_of(&self, product_id: &ProductId) -> Option<u32> {
        self.state.read().unwrap().stock.get(product_id).copied()
    }

    /// Returns every reduction performed, in call order.
    pub fn reductions(&self) -> Vec<(ProductId, u32)> {
        self.state.read().unwrap().reductions.clone()
    }
}

#[async_trait]
impl InventoryClient for InMemoryInventoryClient {
    async fn get_product(
        &self,
        _caller: &Caller,
        product_id: &ProductId,
    ) -> Result<ProductInfo, ClientError> {
        let state = self.state.read().unwrap();
        if state.fail_on_get {
            return Err(ClientError::Unavailable("injected get failure".to_string()));
        }
        state
            .products
            .get(product_id)
            .cloned()
            .ok_or_else(|| ClientError::ProductUnavailable(product_id.clone()))
    }

    async fn check_availability(
        &self,
        _caller: &Caller,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<bool, ClientError> {
        let state = self.state.read().unwrap();
        if state.fail_on_check {
            return Err(ClientError::Unavailable(
                "injected check failure".to_string(),
            ));
        }
        let available = state
            .stock
            .get(product_id)
            .ok_or_else(|| ClientError::ProductUnavailable(product_id.clone()))?;
        Ok(*available >= quantity)
    }

    async fn reduce_stock(
        &self,
        _caller: &Caller,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), ClientError> {
        let mut state = self.state.write().unwrap();
        if state.fail_on_reduce || state.fail_reduce_for.contains(product_id) {
            return Err(ClientError::Unavailable(
                "injected reduce failure".to_string(),
            ));
        }
        let available = state
            .stock
            .get_mut(product_id)
            .ok_or_else(|| ClientError::ProductUnavailable(product_id.clone()))?;
        if *available < quantity {
            return Err(ClientError::InsufficientStock {
                product_id: product_id.clone(),
                requested: quantity,
                available: Some(*available),
            });
        }
        *available -= quantity;
        state.reductions.push((product_id.clone(), quantity));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn widget() -> ProductInfo {
        ProductInfo {
            id: ProductId::new("p-1"),
            name: "Widget".to_string(),
            unit_price: Money::from_cents(1000),
        }
    }

    fn caller() -> Caller {
        Caller::client("u-1", "alice")
    }

    #[tokio::test]
    async fn get_product_returns_scripted_info() {
        let client = InMemoryInventoryClient::new();
        client.add_product(widget(), 5);

        let info = client
            .get_product(&caller(), &ProductId::new("p-1"))
            .await
            .unwrap();
        assert_eq!(info.name, "Widget");
    }

    #[tokio::test]
    async fn unknown_product_is_unavailable() {
        let client = InMemoryInventoryClient::new();
        let result = client.get_product(&caller(), &ProductId::new("nope")).await;
        assert!(matches!(result, Err(ClientError::ProductUnavailable(_))));
    }

    #[tokio::test]
    async fn check_compares_against_stock() {
        let client = InMemoryInventoryClient::new();
        client.add_product(widget(), 5);

        let id = ProductId::new("p-1");
        assert!(client.check_availability(&caller(), &id, 5).await.unwrap());
        assert!(!client.check_availability(&caller(), &id, 6).await.unwrap());
    }

    #[tokio::test]
    async fn reduce_decrements_and_records() {
        let client = InMemoryInventoryClient::new();
        client.add_product(widget(), 5);

        let id = ProductId::new("p-1");
        client.reduce_stock(&caller(), &id, 3).await.unwrap();

        assert_eq!(client.stock_of(&id), Some(2));
        assert_eq!(client.reductions(), vec![(id, 3)]);
    }

    #[tokio::test]
    async fn reduce_guards_against_overdraw() {
        let client = InMemoryInventoryClient::new();
        client.add_product(widget(), 2);

        let result = client
            .reduce_stock(&caller(), &ProductId::new("p-1"), 3)
            .await;
        assert!(matches!(
            result,
            Err(ClientError::InsufficientStock {
                available: Some(2),
                ..
            })
        ));
        assert_eq!(client.stock_of(&ProductId::new("p-1")), Some(2));
    }

    #[tokio::test]
    async fn failure_toggles_inject_transport_errors() {
        let client = InMemoryInventoryClient::new();
        client.add_product(widget(), 5);
        let id = ProductId::new("p-1");

        client.set_fail_on_get(true);
        assert!(matches!(
            client.get_product(&caller(), &id).await,
            Err(ClientError::Unavailable(_))
        ));

        client.set_fail_on_check(true);
        assert!(matches!(
            client.check_availability(&caller(), &id, 1).await,
            Err(ClientError::Unavailable(_))
        ));

        client.set_fail_on_reduce(true);
        assert!(matches!(
            client.reduce_stock(&caller(), &id, 1).await,
            Err(ClientError::Unavailable(_))
        ));
    }
}
