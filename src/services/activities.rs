//! Activity template and instance service

use crate::{
    error::AppResult,
    models::activity::{Activity, ItemRequest, UpdateActivity},
    repository::Repository,
};

#[derive(Clone)]
pub struct ActivitiesService {
    repository: Repository,
}

impl ActivitiesService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn get(&self, id: i32) -> AppResult<Activity> {
        self.repository.activities.get_by_id(id).await
    }

    pub async fn list_templates(&self) -> AppResult<Vec<Activity>> {
        self.repository.activities.list_templates().await
    }

    pub async fn categories(&self) -> AppResult<Vec<String>> {
        self.repository.activities.categories().await
    }

    pub async fn create_template(&self, owner_id: i32, title: &str) -> AppResult<Activity> {
        self.repository.activities.create_template(owner_id, title).await
    }

    /// Edit a template: descriptive fields plus a requisition rewrite.
    ///
    /// Every existing entry is first considered removed (quantity zero),
    /// then the submitted list is merged back over the top. Entries still at
    /// zero after the merge have their link rows deleted, so a zero row is
    /// never stored.
    pub async fn update_template(&self, id: i32, data: &UpdateActivity) -> AppResult<Activity> {
        let mut activity = self.repository.activities.get_by_id(id).await?;

        self.repository
            .activities
            .update_row(
                id,
                data.title.as_deref(),
                data.description.as_deref(),
                data.category.as_deref(),
            )
            .await?;

        if let Some(requests) = &data.equipment {
            for set in &mut activity.equipment {
                set.quantity = 0;
            }
            let merged: Vec<ItemRequest> = requests
                .iter()
                .map(|r| ItemRequest {
                    item_id: r.item_id,
                    quantity: r.quantity,
                    important: r.important,
                })
                .collect();
            activity.merge_requests(&merged);

            for set in &activity.equipment {
                self.repository
                    .activities
                    .write_set(id, set.item_id, set.quantity, set.important)
                    .await?;
            }
        }

        self.repository.activities.get_by_id(id).await
    }

    /// How many bookings were derived from a template, for delete
    /// confirmation screens.
    pub async fn count_instances(&self, template_id: i32) -> AppResult<i64> {
        self.repository.activities.count_instances(template_id).await
    }

    /// Delete a template along with every instance cloned from it and
    /// their bookings.
    pub async fn delete_template(&self, template_id: i32) -> AppResult<()> {
        self.repository
            .activities
            .delete_template_cascade(template_id)
            .await
    }

    /// Clone a template into a persisted temporary instance owned by
    /// `owner_id`, with `extras` appended on top of the template's own
    /// requisitions.
    pub async fn clone_template(
        &self,
        template: &Activity,
        owner_id: i32,
        extras: &[ItemRequest],
    ) -> AppResult<Activity> {
        let mut instance = template.temp();
        instance.owner_id = owner_id;
        instance.merge_requests(extras);
        self.repository.activities.persist_instance(&instance).await
    }

    /// Resolve the template an instance was copied from. Falls back to the
    /// given activity itself when it is not temporary or the parent cannot
    /// be resolved; callers must not use this to distinguish "no parent"
    /// from "parent found".
    pub async fn parent(&self, activity: &Activity) -> Activity {
        if !activity.temporary || activity.copied_from == 0 {
            return activity.clone();
        }

        match self.repository.activities.get_by_id(activity.copied_from).await {
            Ok(parent) => parent,
            Err(_) => activity.clone(),
        }
    }
}
