use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{OrderId, ProductId, ReservationId};
use domain::{Product, Reservation, ReservationStatus};
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::store::{InventoryStore, StockLevels};

/// PostgreSQL-backed inventory store.
///
/// The atomic primitives run inside transactions that take a `FOR UPDATE`
/// row lock on the product row, so concurrent reserves for the same product
/// serialize at the database while different products proceed in parallel.
#[derive(Clone)]
pub struct PostgresInventoryStore {
    pool: PgPool,
}

impl PostgresInventoryStore {
    /// Creates a new PostgreSQL inventory store.
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

    fn status_from_str(s: &str) -> Result<ReservationStatus> {
        match s {
            "Reserved" => Ok(ReservationStatus::Reserved),
            "Confirmed" => Ok(ReservationStatus::Confirmed),
            "Released" => Ok(ReservationStatus::Released),
            other => Err(StoreError::InvalidRow(format!(
                "unknown reservation status: {other}"
            ))),
        }
    }

    fn quantity_from_row(value: i64) -> Result<u32> {
        u32::try_from(value)
            .map_err(|_| StoreError::InvalidRow(format!("quantity out of range: {value}")))
    }

    fn row_to_reservation(row: &PgRow) -> Result<Reservation> {
        let status: String = row.try_get("status")?;
        let quantity: i64 = row.try_get("quantity")?;

        Ok(Reservation::from_parts(
            ReservationId::from_uuid(row.try_get::<Uuid, _>("id")?),
            ProductId::new(row.try_get::<String, _>("product_id")?),
            OrderId::from_uuid(row.try_get::<Uuid, _>("order_id")?),
            Self::quantity_from_row(quantity)?,
            Self::status_from_str(&status)?,
            row.try_get("created_at")?,
            row.try_get("confirmed_at")?,
            row.try_get("released_at")?,
            row.try_get("release_reason")?,
        ))
    }

    fn row_to_product(row: &PgRow) -> Result<Product> {
        let stock: i64 = row.try_get("stock")?;
        Ok(Product::new(
            ProductId::new(row.try_get::<String, _>("id")?),
            row.try_get::<String, _>("name")?,
            Self::quantity_from_row(stock)?,
        ))
    }

    async fn insert_reservation_tx<'e, E>(executor: E, reservation: &Reservation) -> Result<()>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query(
            r#"
            INSERT INTO reservations
                (id, product_id, order_id, quantity, status, created_at,
                 confirmed_at, released_at, release_reason)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(reservation.id().as_uuid())
        .bind(reservation.product_id().as_str())
        .bind(reservation.order_id().as_uuid())
        .bind(i64::from(reservation.quantity()))
        .bind(reservation.status().as_str())
        .bind(reservation.created_at())
        .bind(reservation.confirmed_at())
        .bind(reservation.released_at())
        .bind(reservation.release_reason())
        .execute(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.constraint() == Some("reservations_pkey")
            {
                return StoreError::DuplicateReservation(reservation.id());
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }
}

#[async_trait]
impl InventoryStore for PostgresInventoryStore {
    async fn upsert_product(&self, product: Product) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO products (id, name, stock)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                stock = EXCLUDED.stock
            "#,
        )
        .bind(product.id.as_str())
        .bind(&product.name)
        .bind(i64::from(product.stock))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_product(&self, product_id: &ProductId) -> Result<Option<Product>> {
        let row: Option<PgRow> = sqlx::query("SELECT id, name, stock FROM products WHERE id = $1")
            .bind(product_id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_product).transpose()
    }

    async fn insert_reservation(&self, reservation: Reservation) -> Result<()> {
        Self::insert_reservation_tx(&self.pool, &reservation).await
    }

    async fn get_reservation(&self, id: ReservationId) -> Result<Option<Reservation>> {
        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, product_id, order_id, quantity, status, created_at,
                   confirmed_at, released_at, release_reason
            FROM reservations
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(Self::row_to_reservation).transpose()
    }

    async fn active_reserved(&self, product_id: &ProductId) -> Result<u32> {
        let sum: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(quantity), 0)
            FROM reservations
            WHERE product_id = $1 AND status = 'Reserved'
            "#,
        )
        .bind(product_id.as_str())
        .fetch_one(&self.pool)
        .await?;

        Self::quantity_from_row(sum)
    }

    async fn reservations_for_order(&self, order_id: OrderId) -> Result<Vec<Reservation>> {
        let rows = sqlx::query(
            r#"
            SELECT id, product_id, order_id, quantity, status, created_at,
                   confirmed_at, released_at, release_reason
            FROM reservations
            WHERE order_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(order_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_reservation).collect()
    }

    async fn reserve_if_available(&self, reservation: Reservation) -> Result<StockLevels> {
        let product_id = reservation.product_id().clone();
        let mut tx = self.pool.begin().await?;

        // Lock the product row: concurrent reserves for this product queue
        // here until the insert below commits.
        let stock: Option<i64> =
            sqlx::query_scalar("SELECT stock FROM products WHERE id = $1 FOR UPDATE")
                .bind(product_id.as_str())
                .fetch_optional(&mut *tx)
                .await?;
        let stock = Self::quantity_from_row(
            stock.ok_or_else(|| StoreError::ProductNotFound(product_id.clone()))?,
        )?;

        let active_sum: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(quantity), 0)
            FROM reservations
            WHERE product_id = $1 AND status = 'Reserved'
            "#,
        )
        .bind(product_id.as_str())
        .fetch_one(&mut *tx)
        .await?;
        let active = Self::quantity_from_row(active_sum)?;

        let available = i64::from(stock) - i64::from(active);
        if available < i64::from(reservation.quantity()) {
            return Err(StoreError::InsufficientAvailability {
                product_id,
                available,
                requested: reservation.quantity(),
            });
        }

        let quantity = reservation.quantity();
        Self::insert_reservation_tx(&mut *tx, &reservation).await?;
        tx.commit().await?;

        tracing::debug!(%product_id, quantity, available_after = available - i64::from(quantity), "reservation inserted");
        Ok(StockLevels::new(stock, active + quantity))
    }

    async fn confirm_reservation(
        &self,
        id: ReservationId,
        at: DateTime<Utc>,
    ) -> Result<(Reservation, u32)> {
        let mut tx = self.pool.begin().await?;

        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, product_id, order_id, quantity, status, created_at,
                   confirmed_at, released_at, release_reason
            FROM reservations
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;
        let reservation =
            Self::row_to_reservation(row.as_ref().ok_or(StoreError::ReservationNotFound(id))?)?;

        if !reservation.status().can_confirm() {
            return Err(StoreError::StatusConflict {
                id,
                actual: reservation.status(),
            });
        }

        let product_id = reservation.product_id().clone();
        let stock: Option<i64> =
            sqlx::query_scalar("SELECT stock FROM products WHERE id = $1 FOR UPDATE")
                .bind(product_id.as_str())
                .fetch_optional(&mut *tx)
                .await?;
        let stock = Self::quantity_from_row(
            stock.ok_or_else(|| StoreError::ProductNotFound(product_id.clone()))?,
        )?;

        if stock < reservation.quantity() {
            return Err(StoreError::InsufficientStock {
                product_id,
                stock,
                requested: reservation.quantity(),
            });
        }

        let new_stock = stock - reservation.quantity();
        sqlx::query("UPDATE products SET stock = $2 WHERE id = $1")
            .bind(product_id.as_str())
            .bind(i64::from(new_stock))
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "UPDATE reservations SET status = 'Confirmed', confirmed_at = $2 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(at)
        .execute(&mut *tx)
        .await?;

        // Stock decrement and status flip commit together or not at all.
        tx.commit().await?;

        let mut updated = reservation;
        updated
            .confirm(at)
            .map_err(|e| StoreError::InvalidRow(e.to_string()))?;

        tracing::debug!(%id, %product_id, new_stock, "reservation confirmed");
        Ok((updated, new_stock))
    }

    async fn release_reservation(
        &self,
        id: ReservationId,
        at: DateTime<Utc>,
        reason: &str,
    ) -> Result<Reservation> {
        let mut tx = self.pool.begin().await?;

        let row: Option<PgRow> = sqlx::query(
            r#"
            SELECT id, product_id, order_id, quantity, status, created_at,
                   confirmed_at, released_at, release_reason
            FROM reservations
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;
        let reservation =
            Self::row_to_reservation(row.as_ref().ok_or(StoreError::ReservationNotFound(id))?)?;

        if !reservation.status().can_release() {
            return Err(StoreError::StatusConflict {
                id,
                actual: reservation.status(),
            });
        }

        sqlx::query(
            r#"
            UPDATE reservations
            SET status = 'Released', released_at = $2, release_reason = $3
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .bind(at)
        .bind(reason)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        let mut updated = reservation;
        updated
            .release(at, reason)
            .map_err(|e| StoreError::InvalidRow(e.to_string()))?;

        tracing::debug!(%id, reason, "reservation released");
        Ok(updated)
    }
}
