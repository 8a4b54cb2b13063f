//! Activities repository: templates, temporary instances and their
//! equipment-set link rows

use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::activity::{Activity, ActivityRow, EquipmentSet},
};

#[derive(Clone)]
pub struct ActivitiesRepository {
    pool: Pool<Postgres>,
}

impl ActivitiesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get an activity with its equipment list
    pub async fn get_by_id(&self, id: i32) -> AppResult<Activity> {
        let row = sqlx::query_as::<_, ActivityRow>(
            "SELECT * FROM activities WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Activity {} not found", id)))?;

        let equipment = self.sets_for_activity(id).await?;
        Ok(row.into_activity(equipment))
    }

    /// Equipment sets for one activity
    pub async fn sets_for_activity(&self, activity_id: i32) -> AppResult<Vec<EquipmentSet>> {
        let sets = sqlx::query_as::<_, EquipmentSet>(
            "SELECT * FROM equipment_sets WHERE activity_id = $1 AND deleted_at IS NULL ORDER BY id",
        )
        .bind(activity_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sets)
    }

    /// Equipment sets for a batch of activities in one round trip
    pub async fn sets_for_activities(&self, activity_ids: &[i32]) -> AppResult<Vec<EquipmentSet>> {
        if activity_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sets = sqlx::query_as::<_, EquipmentSet>(
            "SELECT * FROM equipment_sets WHERE activity_id = ANY($1) AND deleted_at IS NULL ORDER BY id",
        )
        .bind(activity_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(sets)
    }

    /// List permanent (template) activities with their equipment
    pub async fn list_templates(&self) -> AppResult<Vec<Activity>> {
        let rows = sqlx::query_as::<_, ActivityRow>(
            "SELECT * FROM activities WHERE temporary = FALSE AND deleted_at IS NULL ORDER BY title",
        )
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i32> = rows.iter().map(|r| r.id).collect();
        let mut sets = self.sets_for_activities(&ids).await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let (mine, rest): (Vec<_>, Vec<_>) =
                sets.into_iter().partition(|s| s.activity_id == row.id);
            sets = rest;
            out.push(row.into_activity(mine));
        }
        Ok(out)
    }

    /// Distinct categories in use across templates
    pub async fn categories(&self) -> AppResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT DISTINCT category FROM activities
            WHERE temporary = FALSE AND deleted_at IS NULL AND category IS NOT NULL
            ORDER BY category
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|(c,)| c).collect())
    }

    /// Create a blank template owned by the given user
    pub async fn create_template(&self, owner_id: i32, title: &str) -> AppResult<Activity> {
        let row = sqlx::query_as::<_, ActivityRow>(
            r#"
            INSERT INTO activities (title, owner_id, temporary, copied_from)
            VALUES ($1, $2, FALSE, 0)
            RETURNING *
            "#,
        )
        .bind(title)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into_activity(Vec::new()))
    }

    /// Update the descriptive fields of an activity
    pub async fn update_row(
        &self,
        id: i32,
        title: Option<&str>,
        description: Option<&str>,
        category: Option<&str>,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE activities SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                category = COALESCE($4, category),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(title)
        .bind(description)
        .bind(category)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Activity {} not found", id)));
        }
        Ok(())
    }

    /// Write one requisition entry: update the matching link row, insert a
    /// new one, or delete it when the quantity drops to zero. A zero row is
    /// never stored.
    pub async fn write_set(
        &self,
        activity_id: i32,
        item_id: i32,
        quantity: i32,
        important: bool,
    ) -> AppResult<()> {
        if quantity == 0 {
            sqlx::query(
                r#"
                UPDATE equipment_sets SET deleted_at = NOW()
                WHERE activity_id = $1 AND item_id = $2 AND important = $3 AND deleted_at IS NULL
                "#,
            )
            .bind(activity_id)
            .bind(item_id)
            .bind(important)
            .execute(&self.pool)
            .await?;
            return Ok(());
        }

        let updated = sqlx::query(
            r#"
            UPDATE equipment_sets SET quantity = $4, updated_at = NOW()
            WHERE activity_id = $1 AND item_id = $2 AND important = $3 AND deleted_at IS NULL
            "#,
        )
        .bind(activity_id)
        .bind(item_id)
        .bind(important)
        .bind(quantity)
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            sqlx::query(
                r#"
                INSERT INTO equipment_sets (activity_id, item_id, quantity, important)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(activity_id)
            .bind(item_id)
            .bind(quantity)
            .bind(important)
            .execute(&self.pool)
            .await?;
        }
        Ok(())
    }

    /// Persist a detached temporary instance produced by [`Activity::temp`]:
    /// inserts the activity row and every equipment set inside one
    /// transaction and returns the stored copy.
    pub async fn persist_instance(&self, instance: &Activity) -> AppResult<Activity> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ActivityRow>(
            r#"
            INSERT INTO activities (title, description, category, owner_id, temporary, copied_from)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&instance.title)
        .bind(&instance.description)
        .bind(&instance.category)
        .bind(instance.owner_id)
        .bind(instance.temporary)
        .bind(instance.copied_from)
        .fetch_one(&mut *tx)
        .await?;

        let mut sets = Vec::with_capacity(instance.equipment.len());
        for set in &instance.equipment {
            // Zero rows are meaningless; skip rather than store them.
            if set.quantity == 0 {
                continue;
            }
            let stored = sqlx::query_as::<_, EquipmentSet>(
                r#"
                INSERT INTO equipment_sets (activity_id, item_id, quantity, important)
                VALUES ($1, $2, $3, $4)
                RETURNING *
                "#,
            )
            .bind(row.id)
            .bind(set.item_id)
            .bind(set.quantity)
            .bind(set.important)
            .fetch_one(&mut *tx)
            .await?;
            sets.push(stored);
        }

        tx.commit().await?;
        Ok(row.into_activity(sets))
    }

    /// Number of instances cloned from a template (bookings derived from it)
    pub async fn count_instances(&self, template_id: i32) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM activities WHERE copied_from = $1 AND deleted_at IS NULL",
        )
        .bind(template_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Soft-delete a template together with every instance cloned from it,
    /// their bookings and all equipment sets, in one transaction. Temporary
    /// instances are refused: they belong to a booking, and deleting one
    /// here would strand that booking with a dangling activity.
    pub async fn delete_template_cascade(&self, template_id: i32) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let target: Option<(bool,)> = sqlx::query_as(
            "SELECT temporary FROM activities WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(template_id)
        .fetch_optional(&mut *tx)
        .await?;

        match target {
            None => {
                return Err(AppError::NotFound(format!(
                    "Activity {} not found",
                    template_id
                )))
            }
            Some((true,)) => {
                return Err(AppError::BusinessRule(format!(
                    "activity {} is a temporary instance; delete its booking instead",
                    template_id
                )))
            }
            Some((false,)) => {}
        }

        let children: Vec<(i32,)> = sqlx::query_as(
            "SELECT id FROM activities WHERE copied_from = $1 AND deleted_at IS NULL",
        )
        .bind(template_id)
        .fetch_all(&mut *tx)
        .await?;

        for (child_id,) in &children {
            sqlx::query(
                "UPDATE equipment_sets SET deleted_at = NOW() WHERE activity_id = $1 AND deleted_at IS NULL",
            )
            .bind(child_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE bookings SET deleted_at = NOW() WHERE activity_id = $1 AND deleted_at IS NULL",
            )
            .bind(child_id)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                "UPDATE activities SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
            )
            .bind(child_id)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            "UPDATE equipment_sets SET deleted_at = NOW() WHERE activity_id = $1 AND deleted_at IS NULL",
        )
        .bind(template_id)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            "UPDATE activities SET deleted_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(template_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Activity {} not found",
                template_id
            )));
        }

        tx.commit().await?;
        Ok(())
    }
}
