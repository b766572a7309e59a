//! Order and order-line entities.

use chrono::{DateTime, Utc};
use common::{Caller, Money, OrderId, ProductId, UserId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;
use crate::error::OrderError;
use crate::status::OrderStatus;

/// One product-quantity entry within an order.
///
/// Product name and unit price are captured at order time and never re-read
/// from the catalog, so later price changes do not retroactively affect
/// existing orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub id: Uuid,

    /// Weak back-reference into the catalog; not an ownership relation.
    pub product_id: ProductId,

    /// Product name at order time.
    pub product_name: String,

    /// Price per unit at order time.
    pub unit_price: Money,

    /// Units ordered. Always positive.
    pub quantity: u32,

    /// `unit_price × quantity`.
    pub subtotal: Money,
}

impl OrderLine {
    /// Creates a line from snapshotted product data.
    pub fn new(
        product_id: ProductId,
        product_name: impl Into<String>,
        unit_price: Money,
        quantity: u32,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            product_id,
            product_name: product_name.into(),
            unit_price,
            quantity,
            subtotal: unit_price.multiply(quantity),
        }
    }
}

/// A requested line in an incoming order: what to buy and how many.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// An order owned by a user, with its lines.
///
/// The order exclusively owns its lines: they are created, persisted, and
/// deleted only as part of the order, and are immutable after placement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,

    /// Denormalized display name of the owner.
    pub username: String,

    pub status: OrderStatus,

    /// Sum of line subtotals at creation time; never recomputed.
    pub total_amount: Money,

    pub lines: Vec<OrderLine>,

    /// Set at creation, immutable.
    pub ordered_at: DateTime<Utc>,

    /// Set on every mutation.
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Creates a new `Pending` order from snapshotted lines.
    pub fn new(user_id: UserId, username: impl Into<String>, lines: Vec<OrderLine>) -> Self {
        let total_amount = lines.iter().map(|line| line.subtotal).sum();
        let now = Utc::now();
        Self {
            id: OrderId::new(),
            user_id,
            username: username.into(),
            status: OrderStatus::Pending,
            total_amount,
            lines,
            ordered_at: now,
            updated_at: now,
        }
    }

    /// Returns true if the order belongs to the given user.
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_id == user_id
    }

    /// Ownership/role gate shared by reads and the cancel transition:
    /// the owner or an admin, anyone else is rejected.
    pub fn ensure_accessible_by(&self, caller: &Caller) -> Result<()> {
        if caller.is_admin() || self.is_owned_by(caller.user_id()) {
            Ok(())
        } else {
            Err(OrderError::UnauthorizedAccess {
                order_id: self.id,
                user_id: caller.user_id().clone(),
            })
        }
    }

    /// Guarded cancel: owner or admin, and only from `Pending` or
    /// `Confirmed`.
    pub fn cancel(&mut self, caller: &Caller) -> Result<()> {
        self.ensure_accessible_by(caller)?;

        if !self.status.can_cancel() {
            return Err(OrderError::InvalidStateTransition {
                order_id: self.id,
                status: self.status,
            });
        }

        self.set_status(OrderStatus::Cancelled);
        Ok(())
    }

    /// Sets the status unconditionally and touches `updated_at`.
    ///
    /// This is the raw mutation used by the orchestrator's confirm step and
    /// the administrative override; callers are responsible for any gating.
    pub fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}
