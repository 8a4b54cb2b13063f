//! Data models for Preproom

pub mod activity;
pub mod booking;
pub mod equipment;
pub mod user;

// Re-export commonly used types
pub use activity::{Activity, EquipmentSet, ItemRequest};
pub use booking::{Booking, BookingStatus};
pub use equipment::EquipmentItem;
pub use user::User;
