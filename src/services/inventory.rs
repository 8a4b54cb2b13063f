//! Inventory ledger service
//!
//! Answers "how much of item X is committed between T1 and T2". The store
//! over-selects bookings by time alone; this layer narrows the result to
//! bookings whose requisitions actually reference the item and sums their
//! quantities.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::{
        booking::Booking,
        equipment::{CreateEquipmentItem, EquipmentItem, UpdateEquipmentItem},
    },
    repository::Repository,
};

/// An inventory item annotated with its commitments over a window, for
/// client display.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnnotatedItem {
    #[serde(flatten)]
    pub item: EquipmentItem,
    /// Bookings referencing the item within the queried window
    pub bookings: Vec<Booking>,
    /// Bookings referencing the item today
    pub daily_bookings: Vec<Booking>,
    /// Units committed within the queried window
    pub usage: i32,
    /// Units committed today
    pub daily_usage: i32,
    /// Capacity minus usage; negative means over-committed
    pub balance: i32,
}

#[derive(Clone)]
pub struct InventoryService {
    repository: Repository,
}

impl InventoryService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> AppResult<Vec<EquipmentItem>> {
        self.repository.inventory.list().await
    }

    pub async fn get(&self, id: i32) -> AppResult<EquipmentItem> {
        self.repository.inventory.get_by_id(id).await
    }

    pub async fn create(&self, data: &CreateEquipmentItem) -> AppResult<EquipmentItem> {
        self.repository.inventory.create(data).await
    }

    pub async fn update(&self, id: i32, data: &UpdateEquipmentItem) -> AppResult<EquipmentItem> {
        self.repository.inventory.update(id, data).await
    }

    pub async fn delete(&self, id: i32) -> AppResult<()> {
        self.repository.inventory.soft_delete(id).await
    }

    /// Bookings referencing the item whose windows overlap `[start, end)`,
    /// paired with the quantity each one requisitions.
    pub async fn bookings_with_usage(
        &self,
        item_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<(Booking, i32)>> {
        let candidates = self
            .repository
            .inventory
            .bookings_overlapping(start, end)
            .await?;

        let activity_ids: Vec<i32> = candidates.iter().map(|b| b.activity_id).collect();
        let sets = self
            .repository
            .activities
            .sets_for_activities(&activity_ids)
            .await?;

        // Requested quantity of the item per activity.
        let mut per_activity: HashMap<i32, i32> = HashMap::new();
        for set in sets.iter().filter(|s| s.item_id == item_id) {
            *per_activity.entry(set.activity_id).or_insert(0) += set.quantity;
        }

        Ok(candidates
            .into_iter()
            .filter(|b| b.overlaps(start, end))
            .filter_map(|b| {
                let qty = *per_activity.get(&b.activity_id)?;
                Some((b, qty))
            })
            .collect())
    }

    /// Bookings referencing the item over the window
    pub async fn bookings(
        &self,
        item_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Booking>> {
        let with_usage = self.bookings_with_usage(item_id, start, end).await?;
        Ok(with_usage.into_iter().map(|(b, _)| b).collect())
    }

    /// Sum of the item's requested quantities across overlapping bookings
    pub async fn usage(
        &self,
        item_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<i32> {
        let with_usage = self.bookings_with_usage(item_id, start, end).await?;
        Ok(with_usage.iter().map(|(_, qty)| qty).sum())
    }

    /// Bookings referencing the item on the day containing `t`
    pub async fn daily_bookings(&self, item_id: i32, t: DateTime<Utc>) -> AppResult<Vec<Booking>> {
        let (start, end) = day_window(t);
        self.bookings(item_id, start, end).await
    }

    /// Usage over the day containing `t`
    pub async fn daily_usage(&self, item_id: i32, t: DateTime<Utc>) -> AppResult<i32> {
        let (start, end) = day_window(t);
        self.usage(item_id, start, end).await
    }

    /// Capacity minus committed usage over the window. Negative means the
    /// item is already over-committed before any new request. An item with
    /// its availability override cleared counts as zero capacity.
    pub async fn net_quantity(
        &self,
        item: &EquipmentItem,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<i32> {
        let usage = self.usage(item.id, start, end).await?;
        Ok(item.effective_quantity() - usage)
    }

    /// Full annotated report for one item. With no explicit window the
    /// current minute is used, as the dashboards expect.
    pub async fn annotated(
        &self,
        item_id: i32,
        window: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> AppResult<AnnotatedItem> {
        let item = self.get(item_id).await?;

        let (start, end) = window.unwrap_or_else(|| {
            let now = Utc::now();
            (now, now + Duration::minutes(1))
        });

        let with_usage = self.bookings_with_usage(item_id, start, end).await?;
        let usage: i32 = with_usage.iter().map(|(_, q)| q).sum();
        let bookings = with_usage.into_iter().map(|(b, _)| b).collect();

        let now = Utc::now();
        let daily_bookings = self.daily_bookings(item_id, now).await?;
        let daily_usage = self.daily_usage(item_id, now).await?;

        Ok(AnnotatedItem {
            balance: item.effective_quantity() - usage,
            item,
            bookings,
            daily_bookings,
            usage,
            daily_usage,
        })
    }
}

/// The UTC day window containing `t`
fn day_window(t: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc
        .from_utc_datetime(&t.date_naive().and_time(NaiveTime::MIN));
    (start, start + Duration::hours(24))
}
