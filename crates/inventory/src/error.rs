use common::ProductId;
use thiserror::Error;

/// Errors that can occur in the inventory engine.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The product id does not exist in the catalog.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// The guarded decrement (or a pre-check) found less stock than requested.
    #[error(
        "Insufficient stock for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

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

impl InventoryError {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        InventoryError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;
