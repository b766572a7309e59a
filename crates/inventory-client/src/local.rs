//! In-process bridge from the order side's boundary onto the inventory
//! engine, for deployments that run both services in one binary.

use async_trait::async_trait;
use common::{Caller, ProductId};
use inventory::{InventoryError, ProductService, ProductStore};
use orders::{ClientError, InventoryClient, ProductInfo};

/// Inventory client that calls an in-process [`ProductService`] directly.
///
/// The error translation mirrors the HTTP client's, so the orchestrator
/// observes the same outcomes whichever deployment shape is in use.
#[derive(Clone)]
pub struct LocalInventoryClient<S: ProductStore> {
    products: ProductService<S>,
}

impl<S: ProductStore> LocalInventoryClient<S> {
    /// Creates a bridge onto the given product service.
    pub fn new(products: ProductService<S>) -> Self {
        Self { products }
    }
}

fn translate(error: InventoryError) -> ClientError {
    match error {
        InventoryError::ProductNotFound(id) => ClientError::ProductUnavailable(id),
        InventoryError::InsufficientStock {
            product_id,
            requested,
            available,
        } => ClientError::InsufficientStock {
            product_id,
            requested,
            available: Some(available),
        },
        InventoryError::Validation { field, reason } => {
            ClientError::Unexpected(format!("bad request: {field}: {reason}"))
        }
        InventoryError::Database(e) => ClientError::Unavailable(e.to_string()),
        InventoryError::Migration(e) => ClientError::Unavailable(e.to_string()),
    }
}

#[async_trait]
impl<S: ProductStore + Clone> InventoryClient for LocalInventoryClient<S> {
    async fn get_product(
        &self,
        _caller: &Caller,
        product_id: &ProductId,
    ) -> Result<ProductInfo, ClientError> {
        let product = self
            .products
            .get_product(product_id)
            .await
            .map_err(translate)?;

        Ok(ProductInfo {
            id: product.id,
            name: product.name,
            unit_price: product.unit_price,
        })
    }

    async fn check_availability(
        &self,
        _caller: &Caller,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<bool, ClientError> {
        self.products
            .check_availability(product_id, quantity)
            .await
            .map_err(translate)
    }

    async fn reduce_stock(
        &self,
        _caller: &Caller,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), ClientError> {
        self.products
            .reduce_stock(product_id, quantity)
            .await
            .map(|_| ())
            .map_err(translate)
    }
}
