//! Booking model and lifecycle predicates

use chrono::{DateTime, Duration, Timelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Booking status.
///
/// Every booking has a status which is changed at will by the technicians
/// (and to certain values by the owning teacher). Transitions are
/// caller-driven; the engine only forces a value on postponement.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema,
)]
#[repr(i16)]
pub enum BookingStatus {
    /// Pending review by a technician. Not yet acknowledged.
    Pending = 0,
    /// The technician has viewed the request and is processing it.
    InProgress = 1,
    /// Prepared and ready for collection.
    Ready = 2,
    /// The technician is unable to fulfil this request.
    Rejected = 3,
}

/// Minimum notice required before the start of a booking for an amendment
/// to be accepted.
pub const AMENDMENT_NOTICE_MINUTES: i64 = 60;

/// An entry in the schedule: a temporary activity bound to a time window,
/// a location and an owning user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Booking {
    pub id: i32,
    pub activity_id: i32,
    pub owner_id: i32,
    /// Location as given by the timetable or entered manually.
    pub location: String,
    pub comments: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// True once the booking's window has fully elapsed.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.end_time < now
    }

    /// True while the booking is running. Evaluated at minute resolution:
    /// a booking also counts as ongoing if its start falls within the
    /// current minute tick, so pollers do not miss one that starts between
    /// two checks.
    pub fn is_ongoing(&self, now: DateTime<Utc>) -> bool {
        if self.start_time < now && now < self.end_time {
            return true;
        }

        let tick = minute_floor(now);
        self.start_time >= tick && self.start_time < tick + Duration::minutes(1)
    }

    /// Window overlap against a query window `[start, end)`.
    ///
    /// The two clauses are deliberately asymmetric: the first catches a
    /// booking that starts before the query and is still running at the
    /// query start, the second catches one that starts anywhere inside the
    /// query window, wherever it ends. Mirrors the SQL pre-filter so
    /// in-memory checks agree with the store.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        (self.start_time <= start && self.end_time >= start)
            || (self.start_time >= start && self.start_time <= end)
    }

    /// Whether the owner may still amend this booking: only unfinalized
    /// statuses, and only up to one hour before the start.
    pub fn may_amend(&self, now: DateTime<Utc>) -> bool {
        matches!(self.status, BookingStatus::Pending | BookingStatus::InProgress)
            && self.start_time - now >= Duration::minutes(AMENDMENT_NOTICE_MINUTES)
    }

    /// Validate an amendment's effective window. Absent bounds default to
    /// the stored ones, so amending a single bound can never store an
    /// inverted window.
    pub fn validate_amend_window(
        &self,
        new_start: Option<DateTime<Utc>>,
        new_end: Option<DateTime<Utc>>,
    ) -> Result<(), String> {
        let start = new_start.unwrap_or(self.start_time);
        let end = new_end.unwrap_or(self.end_time);
        if end <= start {
            return Err("end time must be after start time".to_string());
        }
        Ok(())
    }

    /// Validate a postponement target. Bookings may only move later, never
    /// earlier: this is an escape valve for delays, not a reschedule.
    pub fn validate_postpone(
        &self,
        new_start: DateTime<Utc>,
        new_end: DateTime<Utc>,
    ) -> Result<(), String> {
        if new_end <= new_start {
            return Err("end time must be after start time".to_string());
        }
        if new_start < self.start_time {
            return Err("cannot postpone to an earlier start time".to_string());
        }
        if new_end < self.end_time {
            return Err("cannot postpone to an earlier end time".to_string());
        }
        Ok(())
    }

    /// Status after a successful postponement. A never-acknowledged booking
    /// stays Pending rather than silently appearing in progress.
    pub fn postponed_status(&self) -> BookingStatus {
        match self.status {
            BookingStatus::Pending => BookingStatus::Pending,
            _ => BookingStatus::InProgress,
        }
    }
}

/// Truncate a time to the start of its minute.
fn minute_floor(t: DateTime<Utc>) -> DateTime<Utc> {
    t.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(t)
}

/// Create booking request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBooking {
    /// Template activity to book
    pub activity_id: i32,
    /// Acting user, owner of the new booking
    pub owner_id: i32,
    #[validate(length(min = 1, max = 255))]
    pub location: String,
    pub comments: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Quantity overrides and ad-hoc extras on top of the template
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<super::ItemRequest>,
}

/// Amendment payload: timing, location, comments and a requisition rewrite
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AmendBooking {
    #[validate(length(min = 1, max = 255))]
    pub location: Option<String>,
    pub comments: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<super::ItemRequest>,
}

/// Postponement payload
#[derive(Debug, Deserialize, ToSchema)]
pub struct PostponeBooking {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn booking(start: DateTime<Utc>, end: DateTime<Utc>, status: BookingStatus) -> Booking {
        Booking {
            id: 1,
            activity_id: 2,
            owner_id: 3,
            location: "Lab 4".to_string(),
            comments: None,
            start_time: start,
            end_time: end,
            status,
            created_at: start,
            updated_at: start,
            deleted_at: None,
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 13, h, m, 0).unwrap()
    }

    #[test]
    fn past_is_strict_on_end_time() {
        let b = booking(at(10, 0), at(11, 0), BookingStatus::Pending);
        assert!(!b.is_past(at(11, 0)));
        assert!(b.is_past(at(11, 1)));
        assert!(!b.is_past(at(10, 30)));
    }

    #[test]
    fn ongoing_inside_window() {
        let b = booking(at(10, 0), at(11, 0), BookingStatus::Pending);
        assert!(b.is_ongoing(at(10, 30)));
        assert!(!b.is_ongoing(at(11, 30)));
        assert!(!b.is_ongoing(at(9, 0)));
    }

    #[test]
    fn ongoing_tolerates_minute_tick() {
        // Start lands inside the current minute: counts as ongoing even
        // though `now` is still strictly before it.
        let start = Utc.with_ymd_and_hms(2024, 5, 13, 10, 0, 30).unwrap();
        let b = booking(start, at(11, 0), BookingStatus::Pending);
        let now = Utc.with_ymd_and_hms(2024, 5, 13, 10, 0, 10).unwrap();
        assert!(b.is_ongoing(now));

        // A minute earlier it is not.
        let earlier = Utc.with_ymd_and_hms(2024, 5, 13, 9, 59, 50).unwrap();
        assert!(!b.is_ongoing(earlier));
    }

    #[test]
    fn overlap_rejects_disjoint_windows() {
        let b = booking(at(10, 0), at(11, 0), BookingStatus::Pending);
        assert!(!b.overlaps(at(8, 0), at(9, 0)), "entirely before the booking");
        assert!(!b.overlaps(at(12, 0), at(13, 0)), "entirely after the booking");
    }

    #[test]
    fn overlap_accepts_any_shared_instant() {
        let b = booking(at(10, 0), at(11, 0), BookingStatus::Pending);
        // Booking starts before and ends inside the query.
        assert!(b.overlaps(at(10, 30), at(12, 0)));
        // Booking entirely contains the query.
        assert!(b.overlaps(at(10, 15), at(10, 45)));
        // Booking starts inside the query.
        assert!(b.overlaps(at(9, 0), at(10, 30)));
        // Shared boundary instant.
        assert!(b.overlaps(at(11, 0), at(12, 0)));
    }

    #[test]
    fn amend_boundary_is_exactly_one_hour() {
        let b = booking(at(12, 0), at(13, 0), BookingStatus::Pending);
        assert!(b.may_amend(at(11, 0)), "exactly 60 minutes before");
        assert!(!b.may_amend(at(11, 1)), "59 minutes before");

        let b = booking(at(12, 0), at(13, 0), BookingStatus::InProgress);
        assert!(b.may_amend(at(11, 0)));

        for status in [BookingStatus::Ready, BookingStatus::Rejected] {
            let b = booking(at(12, 0), at(13, 0), status);
            assert!(!b.may_amend(at(9, 0)), "finalized status never amendable");
        }
    }

    #[test]
    fn amend_window_checks_effective_bounds() {
        let b = booking(at(10, 0), at(11, 0), BookingStatus::Pending);

        assert!(b.validate_amend_window(None, None).is_ok());
        assert!(b.validate_amend_window(Some(at(10, 30)), None).is_ok());
        assert!(b.validate_amend_window(None, Some(at(11, 30))).is_ok());
        assert!(b
            .validate_amend_window(Some(at(9, 0)), Some(at(9, 30)))
            .is_ok());

        // A lone start moved past the stored end inverts the window.
        assert!(b.validate_amend_window(Some(at(11, 30)), None).is_err());
        // A lone end moved before the stored start does too.
        assert!(b.validate_amend_window(None, Some(at(9, 30))).is_err());
        assert!(b
            .validate_amend_window(Some(at(12, 0)), Some(at(11, 0)))
            .is_err());
    }

    #[test]
    fn postpone_only_moves_later() {
        let b = booking(at(10, 0), at(11, 0), BookingStatus::Ready);

        assert!(b.validate_postpone(at(10, 30), at(11, 30)).is_ok());
        assert!(b.validate_postpone(at(10, 0), at(11, 0)).is_ok());
        assert!(b.validate_postpone(at(9, 30), at(11, 30)).is_err());
        assert!(b.validate_postpone(at(10, 30), at(10, 45)).is_err());
        assert!(b.validate_postpone(at(12, 0), at(11, 0)).is_err());
    }

    #[test]
    fn postponed_status_rules() {
        let cases = [
            (BookingStatus::Pending, BookingStatus::Pending),
            (BookingStatus::InProgress, BookingStatus::InProgress),
            (BookingStatus::Ready, BookingStatus::InProgress),
            (BookingStatus::Rejected, BookingStatus::InProgress),
        ];
        for (from, want) in cases {
            let b = booking(at(10, 0), at(11, 0), from);
            assert_eq!(b.postponed_status(), want);
        }
    }
}
