//! Equipment inventory repository

use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::booking::Booking,
    models::equipment::{CreateEquipmentItem, EquipmentItem, UpdateEquipmentItem},
};

#[derive(Clone)]
pub struct InventoryRepository {
    pool: Pool<Postgres>,
}

impl InventoryRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List all live equipment items
    pub async fn list(&self) -> AppResult<Vec<EquipmentItem>> {
        let rows = sqlx::query_as::<_, EquipmentItem>(
            "SELECT * FROM equipment_items WHERE deleted_at IS NULL ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Get an equipment item by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<EquipmentItem> {
        sqlx::query_as::<_, EquipmentItem>(
            "SELECT * FROM equipment_items WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Equipment item {} not found", id)))
    }

    /// Create an equipment item
    pub async fn create(&self, data: &CreateEquipmentItem) -> AppResult<EquipmentItem> {
        let row = sqlx::query_as::<_, EquipmentItem>(
            r#"
            INSERT INTO equipment_items
                (name, description, quantity, available,
                 hazard_voltage, hazard_toxic, hazard_laser, hazard_misc)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.quantity)
        .bind(data.available)
        .bind(data.hazard_voltage)
        .bind(data.hazard_toxic)
        .bind(data.hazard_laser)
        .bind(data.hazard_misc)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Update an equipment item. Absent fields keep their stored value.
    pub async fn update(&self, id: i32, data: &UpdateEquipmentItem) -> AppResult<EquipmentItem> {
        sqlx::query_as::<_, EquipmentItem>(
            r#"
            UPDATE equipment_items SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                quantity = COALESCE($4, quantity),
                available = COALESCE($5, available),
                hazard_voltage = COALESCE($6, hazard_voltage),
                hazard_toxic = COALESCE($7, hazard_toxic),
                hazard_laser = COALESCE($8, hazard_laser),
                hazard_misc = COALESCE($9, hazard_misc),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.quantity)
        .bind(data.available)
        .bind(data.hazard_voltage)
        .bind(data.hazard_toxic)
        .bind(data.hazard_laser)
        .bind(data.hazard_misc)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Equipment item {} not found", id)))
    }

    /// Soft-delete an equipment item. The record survives until the
    /// retention purge removes it.
    pub async fn soft_delete(&self, id: i32) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE equipment_items SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Equipment item {} not found", id)));
        }
        Ok(())
    }

    /// Fetch bookings whose window overlaps `[start, end)`.
    ///
    /// The predicate is deliberately the asymmetric two-clause test: a
    /// booking overlaps if it starts before the query and is still running
    /// at the query start, or if it starts anywhere inside the query
    /// window. This over-selects by time only; the caller narrows the
    /// result to bookings whose requisitions actually reference an item.
    pub async fn bookings_overlapping(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE deleted_at IS NULL
              AND ((start_time <= $1 AND end_time >= $1)
                OR (start_time >= $1 AND start_time <= $2))
            ORDER BY start_time
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
