use async_trait::async_trait;
use common::{Money, OrderId, ProductId, UserId};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::Result;
use crate::error::OrderError;
use crate::order::{Order, OrderLine};
use crate::status::OrderStatus;
use crate::store::OrderStore;

/// PostgreSQL-backed order store.
///
/// An order and its lines are written in one transaction; lines are read
/// back in their original position so the request order survives the
/// roundtrip.
#[derive(Clone)]
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgreSQL order store.
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

    fn row_to_order(row: &PgRow, lines: Vec<OrderLine>) -> Result<Order> {
        let status_text: String = row.try_get("status")?;
        let status = OrderStatus::parse(&status_text).ok_or_else(|| {
            OrderError::Database(sqlx::Error::Decode(
                format!("unknown order status: {status_text}").into(),
            ))
        })?;

        Ok(Order {
            id: OrderId::from_uuid(row.try_get::<Uuid, _>("id")?),
            user_id: UserId::new(row.try_get::<String, _>("user_id")?),
            username: row.try_get("username")?,
            status,
            total_amount: Money::from_cents(row.try_get("total_amount_cents")?),
            lines,
            ordered_at: row.try_get("ordered_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_line(row: PgRow) -> Result<OrderLine> {
        Ok(OrderLine {
            id: row.try_get("id")?,
            product_id: ProductId::new(row.try_get::<String, _>("product_id")?),
            product_name: row.try_get("product_name")?,
            unit_price: Money::from_cents(row.try_get("unit_price_cents")?),
            quantity: row.try_get::<i64, _>("quantity")? as u32,
            subtotal: Money::from_cents(row.try_get("subtotal_cents")?),
        })
    }

    async fn load_lines(&self, order_id: OrderId) -> Result<Vec<OrderLine>> {
        let rows = sqlx::query("SELECT * FROM order_lines WHERE order_id = $1 ORDER BY position")
            .bind(order_id.as_uuid())
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_line).collect()
    }

    async fn hydrate(&self, rows: Vec<PgRow>) -> Result<Vec<Order>> {
        let mut orders = Vec::with_capacity(rows.len());
        for row in rows {
            let order_id = OrderId::from_uuid(row.try_get::<Uuid, _>("id")?);
            let lines = self.load_lines(order_id).await?;
            orders.push(Self::row_to_order(&row, lines)?);
        }
        Ok(orders)
    }
}

#[async_trait]
impl OrderStore for PostgresOrderStore {
    async fn insert(&self, order: &Order) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (id, user_id, username, status, total_amount_cents, ordered_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.user_id.as_str())
        .bind(&order.username)
        .bind(order.status.as_str())
        .bind(order.total_amount.cents())
        .bind(order.ordered_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        for (position, line) in order.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_lines (id, order_id, position, product_id, product_name, unit_price_cents, quantity, subtotal_cents)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(line.id)
            .bind(order.id.as_uuid())
            .bind(position as i64)
            .bind(line.product_id.as_str())
            .bind(&line.product_name)
            .bind(line.unit_price.cents())
            .bind(line.quantity as i64)
            .bind(line.subtotal.cents())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: OrderId) -> Result<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let lines = self.load_lines(id).await?;
                Ok(Some(Self::row_to_order(&row, lines)?))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, order: &Order) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = $2, total_amount_cents = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(order.id.as_uuid())
        .bind(order.status.as_str())
        .bind(order.total_amount.cents())
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(OrderError::OrderNotFound(order.id));
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Order>> {
        let rows = sqlx::query("SELECT * FROM orders ORDER BY ordered_at DESC")
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    async fn list_by_user(&self, user_id: &UserId) -> Result<Vec<Order>> {
        let rows = sqlx::query("SELECT * FROM orders WHERE user_id = $1 ORDER BY ordered_at DESC")
            .bind(user_id.as_str())
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }

    async fn list_by_status(&self, status: OrderStatus) -> Result<Vec<Order>> {
        let rows = sqlx::query("SELECT * FROM orders WHERE status = $1 ORDER BY ordered_at DESC")
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;
        self.hydrate(rows).await
    }
}
