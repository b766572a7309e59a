//! Catalog operations and the stock reservation engine.

use common::ProductId;

use crate::Result;
use crate::error::InventoryError;
use crate::product::{NewProduct, Product, ProductUpdate};
use crate::store::ProductStore;

/// Service for managing products and reserving stock.
///
/// This is the only component allowed to mutate stock. Nothing is held
/// between a `check_availability` and a later `reduce_stock`; the reduction
/// re-validates against current stock and is the sole authority.
#[derive(Clone)]
pub struct ProductService<S: ProductStore> {
    store: S,
}

impl<S: ProductStore> ProductService<S> {
    /// Creates a new product service backed by the given store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a new catalog entry.
    #[tracing::instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create_product(&self, new: NewProduct) -> Result<Product> {
        validate_fields(&new.name, new.unit_price)?;

        let product = Product::create(new);
        self.store.insert(&product).await?;

        metrics::counter!("products_created_total").increment(1);
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Fetches a product by id.
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| InventoryError::ProductNotFound(id.clone()))
    }

    /// Lists the whole catalog.
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        self.store.list().await
    }

    /// Replaces a product's mutable fields.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_product(&self, id: &ProductId, update: ProductUpdate) -> Result<Product> {
        validate_fields(&update.name, update.unit_price)?;

        let mut product = self.get_product(id).await?;
        product.apply_update(update);
        self.store.update(&product).await?;

        tracing::info!(product_id = %id, "product updated");
        Ok(product)
    }

    /// Deletes a product. Hard delete, no tombstone.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: &ProductId) -> Result<()> {
        self.store.delete(id).await?;
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    /// Products whose name contains the fragment, case-insensitively.
    pub async fn search_products(&self, fragment: &str) -> Result<Vec<Product>> {
        self.store.search_by_name(fragment).await
    }

    /// Products with stock available.
    pub async fn in_stock_products(&self) -> Result<Vec<Product>> {
        self.store.in_stock().await
    }

    /// Products at or below the given stock threshold.
    pub async fn low_stock_products(&self, threshold: u32) -> Result<Vec<Product>> {
        self.store.low_stock(threshold).await
    }

    /// Returns true iff the product currently has at least `quantity` units.
    ///
    /// Read-only; a `true` result is no guarantee that a later
    /// [`reduce_stock`](Self::reduce_stock) will succeed.
    #[tracing::instrument(skip(self))]
    pub async fn check_availability(&self, id: &ProductId, quantity: u32) -> Result<bool> {
        validate_quantity(quantity)?;

        let product = self.get_product(id).await?;
        let available = product.stock_quantity >= quantity;
        tracing::debug!(product_id = %id, quantity, available, "stock check");
        Ok(available)
    }

    /// Decrements stock by `quantity`, guarding against overdraw.
    ///
    /// The guard and the decrement are atomic per product; concurrent
    /// reducers on the same product serialize at the store. Returns the new
    /// stock level.
    #[tracing::instrument(skip(self))]
    pub async fn reduce_stock(&self, id: &ProductId, quantity: u32) -> Result<u32> {
        validate_quantity(quantity)?;

        let remaining = self.store.decrement_stock(id, quantity).await?;

        metrics::counter!("stock_reductions_total").increment(1);
        tracing::info!(product_id = %id, quantity, remaining, "stock reduced");
        Ok(remaining)
    }
}

fn validate_fields(name: &str, unit_price: common::Money) -> Result<()> {
    if name.trim().is_empty() {
        return Err(InventoryError::validation("name", "must not be blank"));
    }
    if unit_price.is_negative() {
        return Err(InventoryError::validation(
            "unit_price",
            "must not be negative",
        ));
    }
    Ok(())
}

fn validate_quantity(quantity: u32) -> Result<()> {
    if quantity == 0 {
        return Err(InventoryError::validation("quantity", "must be positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryProductStore;
    use common::Money;

    fn service() -> ProductService<InMemoryProductStore> {
        ProductService::new(InMemoryProductStore::new())
    }

    fn widget(stock: u32) -> NewProduct {
        NewProduct {
            name: "Widget".to_string(),
            description: "A widget".to_string(),
            unit_price: Money::from_cents(1000),
            stock_quantity: stock,
        }
    }

    #[tokio::test]
    async fn create_and_get_product() {
        let service = service();
        let created = service.create_product(widget(5)).await.unwrap();

        let fetched = service.get_product(&created.id).await.unwrap();
        assert_eq!(fetched, created);
    }

    #[tokio::test]
    async fn create_with_blank_name_fails() {
        let service = service();
        let mut new = widget(5);
        new.name = "   ".to_string();

        let result = service.create_product(new).await;
        assert!(matches!(
            result,
            Err(InventoryError::Validation { field: "name", .. })
        ));
    }

    #[tokio::test]
    async fn create_with_negative_price_fails() {
        let service = service();
        let mut new = widget(5);
        new.unit_price = Money::from_cents(-1);

        let result = service.create_product(new).await;
        assert!(matches!(
            result,
            Err(InventoryError::Validation {
                field: "unit_price",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn get_missing_product_fails() {
        let service = service();
        let result = service.get_product(&ProductId::new("missing")).await;
        assert!(matches!(result, Err(InventoryError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let service = service();
        let created = service.create_product(widget(5)).await.unwrap();

        let updated = service
            .update_product(
                &created.id,
                ProductUpdate {
                    name: "Gadget".to_string(),
                    description: "Improved".to_string(),
                    unit_price: Money::from_cents(2000),
                    stock_quantity: 8,
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Gadget");
        assert_eq!(updated.stock_quantity, 8);
        assert_eq!(
            service.get_product(&created.id).await.unwrap().name,
            "Gadget"
        );
    }

    #[tokio::test]
    async fn delete_then_get_fails() {
        let service = service();
        let created = service.create_product(widget(5)).await.unwrap();

        service.delete_product(&created.id).await.unwrap();
        let result = service.get_product(&created.id).await;
        assert!(matches!(result, Err(InventoryError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn check_availability_compares_stock() {
        let service = service();
        let created = service.create_product(widget(5)).await.unwrap();

        assert!(service.check_availability(&created.id, 5).await.unwrap());
        assert!(!service.check_availability(&created.id, 6).await.unwrap());
    }

    #[tokio::test]
    async fn check_availability_zero_quantity_fails() {
        let service = service();
        let created = service.create_product(widget(5)).await.unwrap();

        let result = service.check_availability(&created.id, 0).await;
        assert!(matches!(
            result,
            Err(InventoryError::Validation {
                field: "quantity",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn reduce_stock_decrements() {
        let service = service();
        let created = service.create_product(widget(10)).await.unwrap();

        let remaining = service.reduce_stock(&created.id, 4).await.unwrap();
        assert_eq!(remaining, 6);
    }

    #[tokio::test]
    async fn reduce_stock_rejects_overdraw() {
        let service = service();
        let created = service.create_product(widget(3)).await.unwrap();

        let result = service.reduce_stock(&created.id, 5).await;
        assert!(matches!(
            result,
            Err(InventoryError::InsufficientStock {
                requested: 5,
                available: 3,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn availability_check_does_not_reserve() {
        // A successful check gives no hold: stock drained in between makes
        // the later reduction fail.
        let service = service();
        let created = service.create_product(widget(5)).await.unwrap();

        assert!(service.check_availability(&created.id, 5).await.unwrap());
        service.reduce_stock(&created.id, 4).await.unwrap();

        let result = service.reduce_stock(&created.id, 5).await;
        assert!(matches!(
            result,
            Err(InventoryError::InsufficientStock { available: 1, .. })
        ));
    }

    #[tokio::test]
    async fn concurrent_reducers_one_wins() {
        let service = service();
        let created = service.create_product(widget(10)).await.unwrap();

        let s1 = service.clone();
        let s2 = service.clone();
        let id1 = created.id.clone();
        let id2 = created.id.clone();

        let (r1, r2) = tokio::join!(
            tokio::spawn(async move { s1.reduce_stock(&id1, 7).await }),
            tokio::spawn(async move { s2.reduce_stock(&id2, 7).await }),
        );
        let results = [r1.unwrap(), r2.unwrap()];

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(results.iter().any(|r| matches!(
            r,
            Err(InventoryError::InsufficientStock { available: 3, .. })
        )));
    }

    #[tokio::test]
    async fn search_and_stock_queries() {
        let service = service();
        service.create_product(widget(0)).await.unwrap();
        let mut gadget = widget(2);
        gadget.name = "Gadget".to_string();
        service.create_product(gadget).await.unwrap();

        assert_eq!(service.search_products("gad").await.unwrap().len(), 1);
        assert_eq!(service.in_stock_products().await.unwrap().len(), 1);
        assert_eq!(service.low_stock_products(1).await.unwrap().len(), 1);
    }
}
