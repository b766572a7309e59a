//! Order placement orchestration and lifecycle operations.

use std::sync::Arc;

use common::{Caller, OrderId};

use crate::Result;
use crate::client::{InventoryClient, ProductInfo};
use crate::error::OrderError;
use crate::order::{NewOrderLine, Order, OrderLine};
use crate::status::OrderStatus;
use crate::store::OrderStore;

/// Service for placing and managing orders.
///
/// The inventory side is reached only through the [`InventoryClient`]
/// boundary; implementations are chosen at process start, which is why the
/// client is held as a trait object while the store stays generic.
pub struct OrderService<S: OrderStore> {
    store: S,
    inventory: Arc<dyn InventoryClient>,
}

impl<S: OrderStore + Clone> Clone for OrderService<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            inventory: self.inventory.clone(),
        }
    }
}

impl<S: OrderStore> OrderService<S> {
    /// Creates a new order service.
    pub fn new(store: S, inventory: Arc<dyn InventoryClient>) -> Self {
        Self { store, inventory }
    }

    /// Places an order for the calling user.
    ///
    /// Everything that can be validated without mutating shared state is
    /// validated first, so a reject-fast path exists before any durable
    /// write:
    ///
    /// 1. every product is fetched remotely (any failure or miss aborts
    ///    with `ProductUnavailable`, nothing persisted);
    /// 2. every line's availability is checked (a `false` aborts with
    ///    `InsufficientStock`, nothing persisted);
    /// 3. lines and the total are computed from the step-1 snapshots;
    /// 4. the order is persisted as `Pending` — the first durable side
    ///    effect;
    /// 5. stock is reduced remotely per line, best-effort: a failure here
    ///    is logged and counted but neither rolls back the persisted order
    ///    nor blocks the remaining lines. Stock can therefore be over-sold
    ///    relative to confirmed orders — the accepted trade is "order
    ///    exists" over "inventory perfectly consistent";
    /// 6. the order is confirmed and persisted again, regardless of the
    ///    step-5 outcomes.
    #[tracing::instrument(skip(self, caller, items), fields(user = %caller.user_id()))]
    pub async fn create_order(&self, caller: &Caller, items: Vec<NewOrderLine>) -> Result<Order> {
        let start = std::time::Instant::now();

        if items.is_empty() {
            return Err(OrderError::validation("items", "order must have items"));
        }
        for item in &items {
            if item.quantity == 0 {
                return Err(OrderError::validation("quantity", "must be positive"));
            }
        }

        // Step 1: confirm every product exists, snapshotting name and price.
        let mut snapshots: Vec<ProductInfo> = Vec::with_capacity(items.len());
        for item in &items {
            let info = self
                .inventory
                .get_product(caller, &item.product_id)
                .await
                .map_err(|e| {
                    tracing::warn!(product_id = %item.product_id, error = %e, "product fetch failed");
                    OrderError::ProductUnavailable(item.product_id.clone())
                })?;
            snapshots.push(info);
        }

        // Step 2: check availability for every line before touching anything.
        for item in &items {
            let available = self
                .inventory
                .check_availability(caller, &item.product_id, item.quantity)
                .await
                .map_err(|e| {
                    tracing::warn!(product_id = %item.product_id, error = %e, "stock check failed");
                    OrderError::ProductUnavailable(item.product_id.clone())
                })?;
            if !available {
                return Err(OrderError::InsufficientStock {
                    product_id: item.product_id.clone(),
                    requested: item.quantity,
                    available: None,
                });
            }
        }

        // Step 3: lines and total from the snapshots taken in step 1.
        let lines: Vec<OrderLine> = items
            .iter()
            .zip(&snapshots)
            .map(|(item, info)| {
                OrderLine::new(
                    info.id.clone(),
                    info.name.clone(),
                    info.unit_price,
                    item.quantity,
                )
            })
            .collect();

        // Step 4: first durable side effect.
        let mut order = Order::new(caller.user_id().clone(), caller.username(), lines);
        self.store.insert(&order).await?;
        tracing::info!(order_id = %order.id, total = %order.total_amount, "order created");

        // Step 5: reduce stock per line, each attempted independently.
        // Failures are recorded but do not fail the order; there is no
        // compensation path.
        for item in &items {
            match self
                .inventory
                .reduce_stock(caller, &item.product_id, item.quantity)
                .await
            {
                Ok(()) => {
                    tracing::info!(order_id = %order.id, product_id = %item.product_id, "stock reduced");
                }
                Err(e) => {
                    metrics::counter!("stock_reduction_failures_total").increment(1);
                    tracing::error!(
                        order_id = %order.id,
                        product_id = %item.product_id,
                        error = %e,
                        "failed to reduce stock for confirmed order"
                    );
                }
            }
        }

        // Step 6: confirm regardless of individual reduction outcomes.
        order.set_status(OrderStatus::Confirmed);
        self.store.update(&order).await?;
        tracing::info!(order_id = %order.id, "order confirmed");

        metrics::counter!("orders_created_total").increment(1);
        metrics::histogram!("order_create_duration_seconds").record(start.elapsed().as_secs_f64());
        Ok(order)
    }

    /// Fetches an order. Owner or admin only.
    #[tracing::instrument(skip(self, caller))]
    pub async fn get_order(&self, caller: &Caller, order_id: OrderId) -> Result<Order> {
        let order = self.load(order_id).await?;
        order.ensure_accessible_by(caller)?;
        Ok(order)
    }

    /// The calling user's orders, most recent first.
    #[tracing::instrument(skip(self, caller), fields(user = %caller.user_id()))]
    pub async fn get_my_orders(&self, caller: &Caller) -> Result<Vec<Order>> {
        self.store.list_by_user(caller.user_id()).await
    }

    /// All orders, most recent first. Admin only.
    #[tracing::instrument(skip(self, caller))]
    pub async fn get_all_orders(&self, caller: &Caller) -> Result<Vec<Order>> {
        ensure_admin(caller)?;
        self.store.list_all().await
    }

    /// Orders in the given status. Admin only.
    #[tracing::instrument(skip(self, caller))]
    pub async fn get_orders_by_status(
        &self,
        caller: &Caller,
        status: OrderStatus,
    ) -> Result<Vec<Order>> {
        ensure_admin(caller)?;
        self.store.list_by_status(status).await
    }

    /// An order's lines. Owner or admin only.
    #[tracing::instrument(skip(self, caller))]
    pub async fn get_order_items(
        &self,
        caller: &Caller,
        order_id: OrderId,
    ) -> Result<Vec<OrderLine>> {
        let order = self.get_order(caller, order_id).await?;
        Ok(order.lines)
    }

    /// Administrative status override: sets any status unconditionally.
    ///
    /// An operational escape hatch for corrections, separate from the
    /// guarded [`cancel_order`](Self::cancel_order) transition.
    #[tracing::instrument(skip(self, caller))]
    pub async fn update_status(
        &self,
        caller: &Caller,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order> {
        ensure_admin_on(caller, order_id)?;

        let mut order = self.load(order_id).await?;
        order.set_status(status);
        self.store.update(&order).await?;

        tracing::info!(order_id = %order_id, status = %status, "order status overridden");
        Ok(order)
    }

    /// Guarded cancel: owner or admin, from `Pending` or `Confirmed` only.
    #[tracing::instrument(skip(self, caller))]
    pub async fn cancel_order(&self, caller: &Caller, order_id: OrderId) -> Result<Order> {
        let mut order = self.load(order_id).await?;
        order.cancel(caller)?;
        self.store.update(&order).await?;

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(order_id = %order_id, "order cancelled");
        Ok(order)
    }

    async fn load(&self, order_id: OrderId) -> Result<Order> {
        self.store
            .get(order_id)
            .await?
            .ok_or(OrderError::OrderNotFound(order_id))
    }
}

fn ensure_admin(caller: &Caller) -> Result<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(OrderError::AdminRequired)
    }
}

fn ensure_admin_on(caller: &Caller, order_id: OrderId) -> Result<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(OrderError::UnauthorizedAccess {
            order_id,
            user_id: caller.user_id().clone(),
        })
    }
}
