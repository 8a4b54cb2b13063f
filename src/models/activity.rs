//! Activity and equipment-set models
//!
//! An activity describes the equipment needed for a practical and the
//! quantities in which it is needed. A *template* activity is long-lived and
//! reusable; booking one clones it into a *temporary* instance which is owned
//! by exactly one booking and deleted with it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// The details for a booking: required equipment and quantities, linked
/// through [`EquipmentSet`] rows.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Activity {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    /// Free-form grouping. Categories are whatever values exist.
    pub category: Option<String>,
    /// Who owns and can edit the activity.
    pub owner_id: i32,
    /// Temporary activities belong to one booking and may be deleted once
    /// the booking has passed.
    pub temporary: bool,
    /// Template this instance was cloned from. Zero for templates.
    pub copied_from: i32,
    /// Requisitioned equipment, loaded alongside the row.
    #[serde(default)]
    pub equipment: Vec<EquipmentSet>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Bare activity row without its equipment list, as it comes off the wire
/// from the database.
#[derive(Debug, Clone, FromRow)]
pub struct ActivityRow {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub owner_id: i32,
    pub temporary: bool,
    pub copied_from: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl ActivityRow {
    pub fn into_activity(self, equipment: Vec<EquipmentSet>) -> Activity {
        Activity {
            id: self.id,
            title: self.title,
            description: self.description,
            category: self.category,
            owner_id: self.owner_id,
            temporary: self.temporary,
            copied_from: self.copied_from,
            equipment,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
        }
    }
}

/// Link table row for equipment used in an activity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EquipmentSet {
    pub id: i32,
    pub activity_id: i32,
    pub item_id: i32,
    /// Quantity requisitioned for this activity.
    pub quantity: i32,
    /// Marked as important if vital for the activity to succeed.
    pub important: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A requested quantity of one item, as submitted by a caller. This is the
/// structured replacement for the old form-field scanning: the boundary
/// validates it once and the engine never sees a wire encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate, ToSchema)]
pub struct ItemRequest {
    pub item_id: i32,
    #[validate(range(min = 1))]
    pub quantity: i32,
    /// Core requirement rather than an optional "extra".
    #[serde(default)]
    pub important: bool,
}

impl Activity {
    /// Produce a detached copy of this activity suitable for instantiation:
    /// identity and ownership are cleared, `temporary` is set, `copied_from`
    /// records the source, and every equipment set loses its identity and
    /// foreign keys so it will be re-inserted as a fresh row.
    pub fn temp(&self) -> Activity {
        let now = Utc::now();
        Activity {
            id: 0,
            title: self.title.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            owner_id: 0,
            temporary: true,
            copied_from: self.id,
            equipment: self
                .equipment
                .iter()
                .map(|set| EquipmentSet {
                    id: 0,
                    activity_id: 0,
                    item_id: set.item_id,
                    quantity: set.quantity,
                    important: set.important,
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                })
                .collect(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// True for a temporary instance carrying at least one non-important
    /// ("extra") requisition. Used to flag bookings which need extra
    /// attention from whoever prepares them.
    pub fn special(&self) -> bool {
        self.temporary && self.equipment.iter().any(|set| !set.important)
    }

    /// Quantity of one item requisitioned by this activity, summed across
    /// core and extra entries.
    pub fn item_quantity(&self, item_id: i32) -> i32 {
        self.equipment
            .iter()
            .filter(|set| set.item_id == item_id)
            .map(|set| set.quantity)
            .sum()
    }

    /// Merge submitted requests into this activity's equipment list.
    /// Matching entries (same item and importance) are overwritten, new ones
    /// appended. A later write pass deletes entries left at quantity zero.
    pub fn merge_requests(&mut self, requests: &[ItemRequest]) {
        let now = Utc::now();
        for req in requests {
            match self
                .equipment
                .iter_mut()
                .find(|set| set.item_id == req.item_id && set.important == req.important)
            {
                Some(set) => set.quantity = req.quantity,
                None => self.equipment.push(EquipmentSet {
                    id: 0,
                    activity_id: self.id,
                    item_id: req.item_id,
                    quantity: req.quantity,
                    important: req.important,
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                }),
            }
        }
    }
}

/// Create/update payload for template activities
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateActivity {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Full replacement requisition list; entries at quantity zero delete
    /// the link.
    pub equipment: Option<Vec<ZeroableItemRequest>>,
}

/// Like [`ItemRequest`] but permitting zero, which means "remove the link".
/// Only the template editor accepts this form.
#[derive(Debug, Clone, Copy, Deserialize, Validate, ToSchema)]
pub struct ZeroableItemRequest {
    pub item_id: i32,
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[serde(default)]
    pub important: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(id: i32, item_id: i32, quantity: i32, important: bool) -> EquipmentSet {
        let now = Utc::now();
        EquipmentSet {
            id,
            activity_id: 7,
            item_id,
            quantity,
            important,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    fn template() -> Activity {
        let now = Utc::now();
        Activity {
            id: 7,
            title: "Electrolysis".to_string(),
            description: Some("Year 10 practical".to_string()),
            category: Some("Chemistry".to_string()),
            owner_id: 3,
            temporary: false,
            copied_from: 0,
            equipment: vec![set(21, 1, 4, true), set(22, 2, 1, false)],
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn temp_resets_identity_and_links_parent() {
        let tpl = template();
        let inst = tpl.temp();

        assert_eq!(inst.id, 0);
        assert_eq!(inst.owner_id, 0);
        assert!(inst.temporary);
        assert_eq!(inst.copied_from, tpl.id);
        assert_eq!(inst.equipment.len(), tpl.equipment.len());
        for (copy, orig) in inst.equipment.iter().zip(&tpl.equipment) {
            assert_eq!(copy.id, 0);
            assert_eq!(copy.activity_id, 0);
            assert_eq!(copy.item_id, orig.item_id);
            assert_eq!(copy.quantity, orig.quantity);
            assert_eq!(copy.important, orig.important);
        }
    }

    #[test]
    fn special_requires_temporary_and_extra() {
        let tpl = template();
        assert!(!tpl.special(), "templates are never special");

        let inst = tpl.temp();
        assert!(inst.special(), "instance with an extra entry is special");

        let mut core_only = tpl.temp();
        core_only.equipment.retain(|s| s.important);
        assert!(!core_only.special());
    }

    #[test]
    fn item_quantity_sums_core_and_extra() {
        let mut act = template();
        act.equipment.push(set(23, 1, 2, false));
        assert_eq!(act.item_quantity(1), 6);
        assert_eq!(act.item_quantity(2), 1);
        assert_eq!(act.item_quantity(99), 0);
    }

    #[test]
    fn merge_overwrites_matching_and_appends_new() {
        let mut act = template();
        act.merge_requests(&[
            ItemRequest {
                item_id: 1,
                quantity: 9,
                important: true,
            },
            ItemRequest {
                item_id: 5,
                quantity: 2,
                important: false,
            },
        ]);

        assert_eq!(act.item_quantity(1), 9);
        assert_eq!(act.equipment.len(), 3);
        let appended = act.equipment.last().unwrap();
        assert_eq!(appended.item_id, 5);
        assert_eq!(appended.activity_id, act.id);
    }

    #[test]
    fn merge_distinguishes_importance() {
        // An extra request for an item already present as core must not
        // overwrite the core entry.
        let mut act = template();
        act.merge_requests(&[ItemRequest {
            item_id: 1,
            quantity: 2,
            important: false,
        }]);

        assert_eq!(act.equipment.len(), 3);
        assert_eq!(act.item_quantity(1), 6);
    }
}
