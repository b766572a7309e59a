use common::{OrderId, ProductId, UserId};
use thiserror::Error;

use crate::status::OrderStatus;

/// Errors that can occur during order operations.
///
/// Each variant is a distinct caller-visible outcome; the boundary layer
/// maps them to precise statuses rather than a generic failure.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The product is missing or its existence could not be confirmed
    /// remotely. Aborts order creation before any persistence.
    #[error("Product not available: {0}")]
    ProductUnavailable(ProductId),

    /// The stock guard failed at the pre-check or the reduction step.
    #[error("Insufficient stock for product {product_id}: requested {requested}")]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: Option<u32>,
    },

    /// Lookup miss on the order store.
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// The ownership/role gate rejected the caller.
    #[error("User {user_id} is not authorized to access order {order_id}")]
    UnauthorizedAccess { order_id: OrderId, user_id: UserId },

    /// An administrator-only operation was attempted without the role.
    #[error("Administrator role required")]
    AdminRequired,

    /// A guarded transition was attempted from a status that does not
    /// allow it.
    #[error("Cannot cancel order {order_id} with status {status}")]
    InvalidStateTransition {
        order_id: OrderId,
        status: OrderStatus,
    },

    /// The remote inventory collaborator timed out or failed at the
    /// transport level.
    #[error("Inventory service unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Malformed input.
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl OrderError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        OrderError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for order operations.
pub type Result<T> = std::result::Result<T, OrderError>;
