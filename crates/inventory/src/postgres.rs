use async_trait::async_trait;
use chrono::Utc;
use common::{Money, ProductId};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::Result;
use crate::error::InventoryError;
use crate::product::Product;
use crate::store::ProductStore;

/// PostgreSQL-backed product store.
///
/// The guarded decrement is a single conditional `UPDATE`, so the check and
/// the mutation happen under the row's exclusive lock and concurrent
/// reducers serialize per product.
#[derive(Clone)]
pub struct PostgresProductStore {
    pool: PgPool,
}

impl PostgresProductStore {
    /// Creates a new PostgreSQL product store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await
    }

    fn row_to_product(row: PgRow) -> Result<Product> {
        Ok(Product {
            id: ProductId::new(row.try_get::<String, _>("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            stock_quantity: row.try_get::<i64, _>("stock_quantity")? as u32,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn fetch_many(&self, query: sqlx::query::Query<'_, sqlx::Postgres, sqlx::postgres::PgArguments>) -> Result<Vec<Product>> {
        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Self::row_to_product).collect()
    }
}

#[async_trait]
impl ProductStore for PostgresProductStore {
    async fn insert(&self, product: &Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, description, unit_price_cents, stock_quantity, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.unit_price.cents())
        .bind(product.stock_quantity as i64)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: &ProductId) -> Result<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_product).transpose()
    }

    async fn list(&self) -> Result<Vec<Product>> {
        self.fetch_many(sqlx::query("SELECT * FROM products ORDER BY created_at"))
            .await
    }

    async fn update(&self, product: &Product) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET name = $2, description = $3, unit_price_cents = $4, stock_quantity = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.unit_price.cents())
        .bind(product.stock_quantity as i64)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(InventoryError::ProductNotFound(product.id.clone()));
        }
        Ok(())
    }

    async fn delete(&self, id: &ProductId) -> Result<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(InventoryError::ProductNotFound(id.clone()));
        }
        Ok(())
    }

    async fn search_by_name(&self, fragment: &str) -> Result<Vec<Product>> {
        let pattern = format!("%{}%", fragment);
        self.fetch_many(
            sqlx::query("SELECT * FROM products WHERE name ILIKE $1 ORDER BY created_at")
                .bind(pattern),
        )
        .await
    }

    async fn in_stock(&self) -> Result<Vec<Product>> {
        self.fetch_many(sqlx::query(
            "SELECT * FROM products WHERE stock_quantity > 0 ORDER BY created_at",
        ))
        .await
    }

    async fn low_stock(&self, threshold: u32) -> Result<Vec<Product>> {
        self.fetch_many(
            sqlx::query(
                "SELECT * FROM products WHERE stock_quantity <= $1 ORDER BY stock_quantity",
            )
            .bind(threshold as i64),
        )
        .await
    }

    async fn decrement_stock(&self, id: &ProductId, quantity: u32) -> Result<u32> {
        // Guard and mutate in one statement; the row lock serializes
        // concurrent reducers on the same product.
        let row = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity - $2, updated_at = $3
            WHERE id = $1 AND stock_quantity >= $2
            RETURNING stock_quantity
            "#,
        )
        .bind(id.as_str())
        .bind(quantity as i64)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(row.try_get::<i64, _>("stock_quantity")? as u32);
        }

        // The guard rejected the update: distinguish a missing product from
        // insufficient stock and report what was actually available.
        let available: Option<i64> =
            sqlx::query_scalar("SELECT stock_quantity FROM products WHERE id = $1")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await?;

        match available {
            Some(available) => Err(InventoryError::InsufficientStock {
                product_id: id.clone(),
                requested: quantity,
                available: available as u32,
            }),
            None => Err(InventoryError::ProductNotFound(id.clone())),
        }
    }
}
