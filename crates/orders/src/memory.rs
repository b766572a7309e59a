use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use common::{OrderId, UserId};
use tokio::sync::RwLock;

use crate::Result;
use crate::error::OrderError;
use crate::order::Order;
use crate::status::OrderStatus;
use crate::store::OrderStore;

/// In-memory order store for testing and single-node runs.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of orders stored.
    pub async fn count(&self) -> usize {
        self.orders.read().await.len()
    }
}

fn by_recency(orders: &mut [Order]) {
    orders.sort_by(|a, b| {
        b.ordered_at
            .cmp(&a.ordered_at)
            .then_with(|| b.id.as_uuid().cmp(&a.id.as_uuid()))
    });
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(&id).cloned())
    }

    async fn update(&self, order: &Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        match orders.get_mut(&order.id) {
            Some(existing) => {
                *existing = order.clone();
                Ok(())
            }
            None => Err(OrderError::OrderNotFound(order.id)),
        }
    }

    async fn list_all(&self) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut all: Vec<_> = orders.values().cloned().collect();
        by_recency(&mut all);
        Ok(all)
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut mine: Vec<_> = orders
            .values()
            .filter(|o| o.is_owned_by(user_id))
            .cloned()
            .collect();
        by_recency(&mut mine);
        Ok(mine)
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        let orders = self.orders.read().await;
        let mut matching: Vec<_> = orders
            .values()
            .filter(|o| o.status == status)
            .cloned()
            .collect();
        by_recency(&mut matching);
        Ok(matching)
    }
}
