//! Bookings repository

use chrono::{DateTime, Duration, Utc};
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::booking::{Booking, BookingStatus},
};

#[derive(Clone)]
pub struct BookingsRepository {
    pool: Pool<Postgres>,
}

impl BookingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a new booking with Pending status
    pub async fn create(
        &self,
        activity_id: i32,
        owner_id: i32,
        location: &str,
        comments: Option<&str>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Booking> {
        let row = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (activity_id, owner_id, location, comments, start_time, end_time, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(activity_id)
        .bind(owner_id)
        .bind(location)
        .bind(comments)
        .bind(start)
        .bind(end)
        .bind(BookingStatus::Pending)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Get a booking by ID
    pub async fn get_by_id(&self, id: i32) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    /// All live bookings, earliest first
    pub async fn list(&self) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE deleted_at IS NULL ORDER BY start_time",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Bookings starting within `[start, end)`
    pub async fn range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE deleted_at IS NULL AND start_time >= $1 AND start_time < $2
            ORDER BY start_time
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Bookings with a given status
    pub async fn by_status(&self, status: BookingStatus) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE status = $1 AND deleted_at IS NULL ORDER BY start_time",
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Bookings owned by one user
    pub async fn personal(&self, owner_id: i32) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE owner_id = $1 AND deleted_at IS NULL ORDER BY start_time",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Bookings owned by one user starting within `[start, end)`
    pub async fn personal_range(
        &self,
        owner_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE owner_id = $1 AND deleted_at IS NULL
              AND start_time >= $2 AND start_time < $3
            ORDER BY start_time
            "#,
        )
        .bind(owner_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Candidate rows for the minute-resolution "ongoing" predicate. The SQL
    /// pre-filter keeps a one-minute slack before start; the model predicate
    /// makes the final call.
    pub async fn ongoing_candidates(
        &self,
        owner_id: Option<i32>,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Booking>> {
        let slack = now + Duration::minutes(1);
        let rows = match owner_id {
            Some(owner) => {
                sqlx::query_as::<_, Booking>(
                    r#"
                    SELECT * FROM bookings
                    WHERE owner_id = $1 AND deleted_at IS NULL
                      AND end_time > $2 AND start_time <= $3
                    ORDER BY start_time
                    "#,
                )
                .bind(owner)
                .bind(now)
                .bind(slack)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Booking>(
                    r#"
                    SELECT * FROM bookings
                    WHERE deleted_at IS NULL AND end_time > $1 AND start_time <= $2
                    ORDER BY start_time
                    "#,
                )
                .bind(now)
                .bind(slack)
                .fetch_all(&self.pool)
                .await?
            }
        };
        Ok(rows)
    }

    /// Rewrite location, comments and window (amendment)
    pub async fn update_details(
        &self,
        id: i32,
        location: Option<&str>,
        comments: Option<&str>,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings SET
                location = COALESCE($2, location),
                comments = COALESCE($3, comments),
                start_time = COALESCE($4, start_time),
                end_time = COALESCE($5, end_time),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(location)
        .bind(comments)
        .bind(start)
        .bind(end)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    /// Move a booking's window and force its status (postponement)
    pub async fn update_window_status(
        &self,
        id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        status: BookingStatus,
    ) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings SET
                start_time = $2, end_time = $3, status = $4, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(start)
        .bind(end)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    /// Set the booking status (caller-driven transition)
    pub async fn set_status(&self, id: i32, status: BookingStatus) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>(
            r#"
            UPDATE bookings SET status = $2, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", id)))
    }

    /// Delete a booking and, when its activity is temporary, the activity
    /// and its equipment sets, in one transaction. A non-temporary activity
    /// is left alone: templates must never be destroyed by a booking
    /// deletion.
    pub async fn delete_cascade(&self, id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let booking: Option<(i32,)> = sqlx::query_as(
            "SELECT activity_id FROM bookings WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((activity_id,)) = booking else {
            return Err(AppError::NotFound(format!("Booking {} not found", id)));
        };

        sqlx::query("UPDATE bookings SET deleted_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let temporary: Option<(bool,)> = sqlx::query_as(
            "SELECT temporary FROM activities WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(activity_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some((true,)) = temporary {
            sqlx::query(
                "UPDATE equipment_sets SET deleted_at = NOW() WHERE activity_id = $1 AND deleted_at IS NULL",
            )
            .bind(activity_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE activities SET deleted_at = NOW() WHERE id = $1")
                .bind(activity_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// One page of bookings whose window has fully elapsed, oldest first
    pub async fn expired_page(&self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE deleted_at IS NULL AND end_time < $1
            ORDER BY end_time
            LIMIT $2
            "#,
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
