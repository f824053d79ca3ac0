use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::{
    MedicineId, MedicineRow, OrderId, OrderLineRow, OrderRow, Result, StatusId, StatusRow,
    StoreError, UserId, UserRow, Version,
    store::{CatalogLookup, OrderRepository, validate_order_for_save},
};

// Money columns are NUMERIC(38, 2); they cross the wire as integer cents.
const ORDER_COLUMNS: &str = r#"
    SELECT o.order_id, o.user_id, o.status_id, s.status_name, o.shipping_address,
           (o.total_amount * 100)::BIGINT AS total_amount_cents, o.create_at, o.version
    FROM orders o
    LEFT JOIN order_statuses s ON s.status_id = o.status_id
"#;

const LINE_COLUMNS: &str = r#"
    SELECT order_id, medicine_id, medicine_name, quantity,
           (price * 100)::BIGINT AS price_cents
    FROM order_details
"#;

/// PostgreSQL-backed store implementation.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a new PostgreSQL store.
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

    fn row_to_order(row: PgRow) -> Result<OrderRow> {
        let status_id: Option<i32> = row.try_get("status_id")?;
        let status_name: Option<String> = row.try_get("status_name")?;
        let status = match (status_id, status_name) {
            (Some(id), Some(name)) => Some(StatusRow::new(id, name)),
            _ => None,
        };

        Ok(OrderRow {
            id: OrderId::new(row.try_get("order_id")?),
            user_id: row.try_get::<Option<i64>, _>("user_id")?.map(UserId::new),
            status,
            shipping_address: row.try_get("shipping_address")?,
            total_amount_cents: row.try_get("total_amount_cents")?,
            created_at: row.try_get("create_at")?,
            version: Version::new(row.try_get("version")?),
            lines: Vec::new(),
        })
    }

    fn row_to_line(row: PgRow) -> Result<OrderLineRow> {
        Ok(OrderLineRow {
            order_id: OrderId::new(row.try_get("order_id")?),
            medicine_id: MedicineId::new(row.try_get("medicine_id")?),
            medicine_name: row.try_get("medicine_name")?,
            quantity: row.try_get("quantity")?,
            price_cents: row.try_get("price_cents")?,
        })
    }

    /// Fetches the lines of the given orders in one round trip and attaches them.
    async fn attach_lines(&self, mut orders: Vec<OrderRow>) -> Result<Vec<OrderRow>> {
        if orders.is_empty() {
            return Ok(orders);
        }

        let ids: Vec<i64> = orders.iter().map(|o| o.id.get()).collect();
        let rows = sqlx::query(&format!(
            "{LINE_COLUMNS} WHERE order_id = ANY($1) ORDER BY order_id, medicine_id"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_order: HashMap<OrderId, Vec<OrderLineRow>> = HashMap::new();
        for row in rows {
            let line = Self::row_to_line(row)?;
            by_order.entry(line.order_id).or_default().push(line);
        }

        for order in &mut orders {
            order.lines = by_order.remove(&order.id).unwrap_or_default();
        }

        Ok(orders)
    }

    fn row_to_status(row: PgRow) -> Result<StatusRow> {
        Ok(StatusRow::new(
            row.try_get::<i32, _>("status_id")?,
            row.try_get::<String, _>("status_name")?,
        ))
    }

    fn row_to_user(row: PgRow) -> Result<UserRow> {
        Ok(UserRow::new(
            row.try_get::<i64, _>("user_id")?,
            row.try_get::<String, _>("full_name")?,
            row.try_get::<String, _>("email")?,
        ))
    }
}

#[async_trait]
impl CatalogLookup for PostgresStore {
    async fn find_medicine_by_id(&self, id: MedicineId) -> Result<Option<MedicineRow>> {
        let row = sqlx::query(
            r#"
            SELECT medicine_id, medicine_name, (price * 100)::BIGINT AS price_cents
            FROM medicines
            WHERE medicine_id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| {
            Ok(MedicineRow::new(
                row.try_get::<i64, _>("medicine_id")?,
                row.try_get::<String, _>("medicine_name")?,
                row.try_get::<i64, _>("price_cents")?,
            ))
        })
        .transpose()
    }

    async fn find_user_by_id(&self, id: UserId) -> Result<Option<UserRow>> {
        let row = sqlx::query("SELECT user_id, full_name, email FROM users WHERE user_id = $1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        let row = sqlx::query("SELECT user_id, full_name, email FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn find_status_by_id(&self, id: StatusId) -> Result<Option<StatusRow>> {
        let row = sqlx::query(
            "SELECT status_id, status_name FROM order_statuses WHERE status_id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_status).transpose()
    }

    async fn find_status_by_name(&self, name: &str) -> Result<Option<StatusRow>> {
        let row = sqlx::query(
            r#"
            SELECT status_id, status_name
            FROM order_statuses
            WHERE LOWER(status_name) = LOWER($1)
            ORDER BY status_id
            LIMIT 1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_status).transpose()
    }

    async fn list_statuses(&self) -> Result<Vec<StatusRow>> {
        let rows = sqlx::query("SELECT status_id, status_name FROM order_statuses ORDER BY status_id")
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Self::row_to_status).collect()
    }
}

#[async_trait]
impl OrderRepository for PostgresStore {
    async fn next_order_id(&self) -> Result<OrderId> {
        let id: i64 =
            sqlx::query_scalar("SELECT nextval(pg_get_serial_sequence('orders', 'order_id'))")
                .fetch_one(&self.pool)
                .await?;

        Ok(OrderId::new(id))
    }

    async fn save(&self, order: &OrderRow, expected: Version) -> Result<Version> {
        validate_order_for_save(order)?;

        let order_id = order.id;
        let new_version = expected.next();

        // Start a transaction
        let mut tx = self.pool.begin().await?;

        if expected == Version::initial() {
            sqlx::query(
                r#"
                INSERT INTO orders (order_id, user_id, status_id, shipping_address, total_amount, create_at, version)
                VALUES ($1, $2, $3, $4, ($5::BIGINT)::NUMERIC / 100, $6, $7)
                "#,
            )
            .bind(order_id.get())
            .bind(order.user_id.map(|u| u.get()))
            .bind(order.status.as_ref().map(|s| s.id.get()))
            .bind(&order.shipping_address)
            .bind(order.total_amount_cents)
            .bind(order.created_at)
            .bind(new_version.as_i64())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.constraint() == Some("orders_pkey")
                {
                    return StoreError::DuplicateOrder(order_id);
                }
                StoreError::Database(e)
            })?;
        } else {
            let result = sqlx::query(
                r#"
                UPDATE orders
                SET user_id = $2, status_id = $3, shipping_address = $4,
                    total_amount = ($5::BIGINT)::NUMERIC / 100, version = $6
                WHERE order_id = $1 AND version = $7
                "#,
            )
            .bind(order_id.get())
            .bind(order.user_id.map(|u| u.get()))
            .bind(order.status.as_ref().map(|s| s.id.get()))
            .bind(&order.shipping_address)
            .bind(order.total_amount_cents)
            .bind(new_version.as_i64())
            .bind(expected.as_i64())
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let actual: Option<i64> =
                    sqlx::query_scalar("SELECT version FROM orders WHERE order_id = $1")
                        .bind(order_id.get())
                        .fetch_optional(&mut *tx)
                        .await?;

                return Err(StoreError::ConcurrencyConflict {
                    order_id,
                    expected,
                    actual: Version::new(actual.unwrap_or(0)),
                });
            }

            sqlx::query("DELETE FROM order_details WHERE order_id = $1")
                .bind(order_id.get())
                .execute(&mut *tx)
                .await?;
        }

        for line in &order.lines {
            sqlx::query(
                r#"
                INSERT INTO order_details (order_id, medicine_id, medicine_name, quantity, price)
                VALUES ($1, $2, $3, $4, ($5::BIGINT)::NUMERIC / 100)
                "#,
            )
            .bind(order_id.get())
            .bind(line.medicine_id.get())
            .bind(&line.medicine_name)
            .bind(line.quantity)
            .bind(line.price_cents)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(%order_id, version = %new_version, lines = order.lines.len(), "order saved");
        Ok(new_version)
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<OrderRow>> {
        let row = sqlx::query(&format!("{ORDER_COLUMNS} WHERE o.order_id = $1"))
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let order = Self::row_to_order(row)?;
        Ok(self.attach_lines(vec![order]).await?.pop())
    }

    async fn find_all(&self) -> Result<Vec<OrderRow>> {
        let rows = sqlx::query(&format!("{ORDER_COLUMNS} ORDER BY o.order_id"))
            .fetch_all(&self.pool)
            .await?;

        let orders = rows
            .into_iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;
        self.attach_lines(orders).await
    }

    async fn find_by_user(&self, user_id: UserId) -> Result<Vec<OrderRow>> {
        let rows = sqlx::query(&format!(
            "{ORDER_COLUMNS} WHERE o.user_id = $1 ORDER BY o.order_id"
        ))
        .bind(user_id.get())
        .fetch_all(&self.pool)
        .await?;

        let orders = rows
            .into_iter()
            .map(Self::row_to_order)
            .collect::<Result<Vec<_>>>()?;
        self.attach_lines(orders).await
    }

    async fn find_line(
        &self,
        order_id: OrderId,
        medicine_id: MedicineId,
    ) -> Result<Option<OrderLineRow>> {
        let row = sqlx::query(&format!(
            "{LINE_COLUMNS} WHERE order_id = $1 AND medicine_id = $2"
        ))
        .bind(order_id.get())
        .bind(medicine_id.get())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_line).transpose()
    }

    async fn find_lines_by_order(&self, order_id: OrderId) -> Result<Vec<OrderLineRow>> {
        let rows = sqlx::query(&format!(
            "{LINE_COLUMNS} WHERE order_id = $1 ORDER BY medicine_id"
        ))
        .bind(order_id.get())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_line).collect()
    }

    async fn find_lines_by_medicine(&self, medicine_id: MedicineId) -> Result<Vec<OrderLineRow>> {
        let rows = sqlx::query(&format!(
            "{LINE_COLUMNS} WHERE medicine_id = $1 ORDER BY order_id"
        ))
        .bind(medicine_id.get())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Self::row_to_line).collect()
    }

    async fn delete(&self, id: OrderId) -> Result<bool> {
        // order_details rows go with it via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM orders WHERE order_id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
