//! Product entity and its creation/update payloads.

use chrono::{DateTime, Utc};
use common::{Money, ProductId};
use serde::{Deserialize, Serialize};

/// A catalog entry with its current stock counter.
///
/// The stock counter is the only piece of state in the system mutated
/// concurrently by unrelated callers; it changes only through the store's
/// guarded decrement or an administrative update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Opaque stable key.
    pub id: ProductId,

    /// Display name.
    pub name: String,

    /// Free-form description.
    pub description: String,

    /// Price per unit.
    pub unit_price: Money,

    /// Units currently available. Never negative.
    pub stock_quantity: u32,

    /// Set at creation, immutable.
    pub created_at: DateTime<Utc>,

    /// Set on every mutation.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Builds a product from an admin creation request, assigning a fresh id.
    pub fn create(new: NewProduct) -> Self {
        let now = Utc::now();
        Self {
            id: ProductId::generate(),
            name: new.name,
            description: new.description,
            unit_price: new.unit_price,
            stock_quantity: new.stock_quantity,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies an admin update in place and touches `updated_at`.
    pub fn apply_update(&mut self, update: ProductUpdate) {
        self.name = update.name;
        self.description = update.description;
        self.unit_price = update.unit_price;
        self.stock_quantity = update.stock_quantity;
        self.updated_at = Utc::now();
    }
}

/// Payload for creating a product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub unit_price: Money,
    pub stock_quantity: u32,
}

/// Payload for replacing a product's mutable fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: String,
    pub description: String,
    pub unit_price: Money,
    pub stock_quantity: u32,
}
