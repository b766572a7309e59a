//! Storage trait for orders.

use async_trait::async_trait;
use common::{OrderId, UserId};

use crate::Result;
use crate::order::Order;
use crate::status::OrderStatus;

/// Durable keyed store for orders and their lines.
///
/// Lines travel with their order: `insert` persists them, `get` returns
/// them in request order, and nothing updates them separately. Orders are
/// mutated only by their single creating/updating request, so no store-level
/// concurrency control is needed here.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Inserts a new order with its lines.
    async fn insert(&self, order: &Order) -> Result<()>;

    /// Fetches an order with its lines. Returns `None` on a miss.
    async fn get(&self, id: OrderId) -> Result<Option<Order>>;

    /// Persists an order's mutable fields (status, `updated_at`).
    /// Fails with `OrderNotFound` on a miss.
    async fn update(&self, order: &Order) -> Result<()>;

    /// All orders, most recent first.
    async fn list_all(&self) -> Result<Vec<Order>>;

    /// A user's orders, most recent first.
    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Order>>;

    /// Orders currently in the given status, most recent first.
    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>>;
}
