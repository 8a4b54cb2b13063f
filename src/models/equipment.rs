//! Equipment inventory model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// An entry in the equipment inventory. Carries a stock level and status
/// flags (hazard warnings, availability override).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct EquipmentItem {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    /// Total units held
    pub quantity: i32,
    /// Availability override. If false, quantity is treated as though zero.
    pub available: bool,
    pub hazard_voltage: bool,
    pub hazard_toxic: bool,
    pub hazard_laser: bool,
    pub hazard_misc: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl EquipmentItem {
    /// Usable capacity once the availability override is applied.
    pub fn effective_quantity(&self) -> i32 {
        if self.available {
            self.quantity
        } else {
            0
        }
    }
}

/// Create equipment request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateEquipmentItem {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[serde(default = "default_available")]
    pub available: bool,
    #[serde(default)]
    pub hazard_voltage: bool,
    #[serde(default)]
    pub hazard_toxic: bool,
    #[serde(default)]
    pub hazard_laser: bool,
    #[serde(default)]
    pub hazard_misc: bool,
}

fn default_available() -> bool {
    true
}

/// Update equipment request. Absent fields are left untouched.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateEquipmentItem {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub quantity: Option<i32>,
    pub available: Option<bool>,
    pub hazard_voltage: Option<bool>,
    pub hazard_toxic: Option<bool>,
    pub hazard_laser: Option<bool>,
    pub hazard_misc: Option<bool>,
}
