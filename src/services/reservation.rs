//! Reservation clash engine
//!
//! Given a requested item set and a proposed window, computes each item's
//! net availability and enumerates every conflicting booking individually,
//! so a reviewer can weigh each collision rather than getting a bare
//! pass/fail.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::{
        activity::{Activity, ItemRequest},
        booking::Booking,
        equipment::EquipmentItem,
    },
    repository::Repository,
};

use super::{activities::ActivitiesService, inventory::InventoryService};

/// One conflicting reservation for one requested item.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ClashRecord {
    pub item_id: i32,
    pub item_name: String,
    /// Total capacity of the item (zero when unavailable)
    pub capacity: i32,
    /// Net quantity over the window before the new request
    pub net_quantity: i32,
    /// Quantity the caller asked for
    pub requested: i32,
    /// Quantity the colliding booking has requisitioned
    pub booked: i32,
    pub booking_id: i32,
    pub booking_owner: i32,
    /// Title of the colliding booking's parent activity
    pub activity_title: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Per-item balance after the hypothetical booking.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ItemBalance {
    pub item_id: i32,
    pub item_name: String,
    /// Net quantity before the request
    pub net_quantity: i32,
    /// Balance left after the request; unchanged when already in deficit
    pub remaining: i32,
    pub clashes: bool,
}

/// Result of a clash assessment over one window.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AvailabilityReport {
    pub ok: bool,
    pub balances: Vec<ItemBalance>,
    pub clashes: Vec<ClashRecord>,
}

/// A booking colliding with a request, with enough context to report it.
pub(crate) struct Collider {
    pub booking: Booking,
    pub activity: Activity,
    pub parent_title: String,
}

/// Decide whether one request clashes and what balance it leaves behind.
///
/// A clash is flagged when the window is already in deficit or cannot absorb
/// the requested quantity. A non-negative net is reduced by the request; a
/// negative net is reported as-is, since it is already short.
pub(crate) fn evaluate_item(requested: i32, net: i32) -> (i32, bool) {
    let clash = net < 0 || net < requested;
    let remaining = if net >= 0 { net - requested } else { net };
    (remaining, clash)
}

/// Build one clash record per colliding booking for a single item request.
pub(crate) fn build_clash_records(
    request: &ItemRequest,
    item: &EquipmentItem,
    net: i32,
    colliders: &[Collider],
) -> Vec<ClashRecord> {
    colliders
        .iter()
        .map(|c| ClashRecord {
            item_id: item.id,
            item_name: item.name.clone(),
            capacity: item.effective_quantity(),
            net_quantity: net,
            requested: request.quantity,
            booked: c.activity.item_quantity(item.id),
            booking_id: c.booking.id,
            booking_owner: c.booking.owner_id,
            activity_title: c.parent_title.clone(),
            start_time: c.booking.start_time,
            end_time: c.booking.end_time,
        })
        .collect()
}

#[derive(Clone)]
pub struct ReservationService {
    repository: Repository,
    inventory: InventoryService,
    activities: ActivitiesService,
}

impl ReservationService {
    pub fn new(repository: Repository) -> Self {
        Self {
            inventory: InventoryService::new(repository.clone()),
            activities: ActivitiesService::new(repository.clone()),
            repository,
        }
    }

    /// Assess a requested item set against `[start, end)`.
    ///
    /// There is no lock between this read and any subsequent booking
    /// insert: two concurrent requests can both pass and jointly
    /// over-commit an item. That gap is the documented behavior of the
    /// system; the next assessment of the window reports the deficit.
    pub async fn check(
        &self,
        requests: &[ItemRequest],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<AvailabilityReport> {
        if end <= start {
            return Err(AppError::Validation(
                "end time must be after start time".to_string(),
            ));
        }

        let mut balances = Vec::with_capacity(requests.len());
        let mut clashes = Vec::new();

        for request in requests {
            if request.quantity <= 0 {
                return Err(AppError::Validation(format!(
                    "requested quantity for item {} must be positive",
                    request.item_id
                )));
            }

            let item = self.repository.inventory.get_by_id(request.item_id).await?;
            let net = self.inventory.net_quantity(&item, start, end).await?;
            let (remaining, clash) = evaluate_item(request.quantity, net);

            if clash {
                let colliders = self.colliders(item.id, start, end).await?;
                clashes.extend(build_clash_records(request, &item, net, &colliders));
            }

            balances.push(ItemBalance {
                item_id: item.id,
                item_name: item.name,
                net_quantity: net,
                remaining,
                clashes: clash,
            });
        }

        Ok(AvailabilityReport {
            ok: clashes.is_empty(),
            balances,
            clashes,
        })
    }

    /// Gather the overlapping bookings for an item together with their
    /// activities and parent titles.
    async fn colliders(
        &self,
        item_id: i32,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> AppResult<Vec<Collider>> {
        let bookings = self.inventory.bookings(item_id, start, end).await?;

        let mut out = Vec::with_capacity(bookings.len());
        for booking in bookings {
            let activity = self
                .repository
                .activities
                .get_by_id(booking.activity_id)
                .await?;
            let parent_title = self.activities.parent(&activity).await.title;
            out.push(Collider {
                booking,
                activity,
                parent_title,
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::activity::EquipmentSet;
    use crate::models::booking::BookingStatus;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 13, h, m, 0).unwrap()
    }

    fn item(id: i32, quantity: i32, available: bool) -> EquipmentItem {
        EquipmentItem {
            id,
            name: "Bunsen burner".to_string(),
            description: None,
            quantity,
            available,
            hazard_voltage: false,
            hazard_toxic: false,
            hazard_laser: false,
            hazard_misc: false,
            created_at: at(0, 0),
            updated_at: at(0, 0),
            deleted_at: None,
        }
    }

    fn collider(booking_id: i32, item_id: i32, booked: i32) -> Collider {
        let now = at(0, 0);
        let activity = Activity {
            id: 40,
            title: "Combustion instance".to_string(),
            description: None,
            category: None,
            owner_id: 8,
            temporary: true,
            copied_from: 4,
            equipment: vec![EquipmentSet {
                id: 90,
                activity_id: 40,
                item_id,
                quantity: booked,
                important: true,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            }],
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        Collider {
            booking: Booking {
                id: booking_id,
                activity_id: 40,
                owner_id: 8,
                location: "Lab 2".to_string(),
                comments: None,
                start_time: at(10, 0),
                end_time: at(11, 0),
                status: BookingStatus::Pending,
                created_at: now,
                updated_at: now,
                deleted_at: None,
            },
            activity,
            parent_title: "Combustion".to_string(),
        }
    }

    #[test]
    fn sufficient_capacity_reduces_balance() {
        let (remaining, clash) = evaluate_item(3, 5);
        assert!(!clash);
        assert_eq!(remaining, 2);
    }

    #[test]
    fn exact_fit_is_not_a_clash() {
        let (remaining, clash) = evaluate_item(5, 5);
        assert!(!clash);
        assert_eq!(remaining, 0);
    }

    #[test]
    fn shortfall_is_a_clash() {
        let (remaining, clash) = evaluate_item(6, 5);
        assert!(clash);
        assert_eq!(remaining, -1);
    }

    #[test]
    fn deficit_is_kept_as_is() {
        // Already over-committed before this request: report the deficit
        // unchanged rather than deepening it.
        let (remaining, clash) = evaluate_item(1, -2);
        assert!(clash);
        assert_eq!(remaining, -2);
    }

    #[test]
    fn fully_booked_item_yields_one_record_per_collider() {
        // Capacity 5, an existing booking holds all 5 over 10:00-11:00,
        // and a new request wants 1 more inside that window.
        let it = item(1, 5, true);
        let request = ItemRequest {
            item_id: 1,
            quantity: 1,
            important: true,
        };
        let net = 0; // 5 capacity - 5 booked
        let (_, clash) = evaluate_item(request.quantity, net);
        assert!(clash);

        let colliders = vec![collider(70, 1, 5)];
        let records = build_clash_records(&request, &it, net, &colliders);

        assert_eq!(records.len(), 1);
        let rec = &records[0];
        assert_eq!(rec.booking_id, 70);
        assert_eq!(rec.capacity, 5);
        assert_eq!(rec.net_quantity, 0);
        assert_eq!(rec.requested, 1);
        assert_eq!(rec.booked, 5);
        assert_eq!(rec.activity_title, "Combustion");
    }

    #[test]
    fn unavailable_item_reports_zero_capacity() {
        let it = item(2, 10, false);
        let request = ItemRequest {
            item_id: 2,
            quantity: 1,
            important: false,
        };
        let records = build_clash_records(&request, &it, 0, &[collider(71, 2, 3)]);
        assert_eq!(records[0].capacity, 0);
    }
}
