//! Booking lifecycle service
//!
//! Orchestrates the template-clone-book flow, amendments, postponements and
//! deletions, and pushes notifications to the parties affected by each
//! transition.

use std::sync::Arc;

use chrono::Utc;

use crate::{
    error::{AppError, AppResult},
    models::{
        activity::ItemRequest,
        booking::{AmendBooking, Booking, BookingStatus, CreateBooking, PostponeBooking},
    },
    repository::Repository,
};

use super::{
    activities::ActivitiesService,
    notifications::{Notification, NotificationStore, Severity},
};

#[derive(Clone)]
pub struct BookingsService {
    repository: Repository,
    activities: ActivitiesService,
    notifications: Arc<NotificationStore>,
}

impl BookingsService {
    pub fn new(repository: Repository, notifications: Arc<NotificationStore>) -> Self {
        Self {
            activities: ActivitiesService::new(repository.clone()),
            repository,
            notifications,
        }
    }

    /// Book a template: clone it into an owned temporary instance, apply the
    /// caller's quantity overrides, and schedule the instance.
    pub async fn create(&self, data: &CreateBooking) -> AppResult<Booking> {
        if data.end_time <= data.start_time {
            return Err(AppError::Validation(
                "end time must be after start time".to_string(),
            ));
        }

        let template = self.repository.activities.get_by_id(data.activity_id).await?;
        if template.temporary {
            return Err(AppError::BusinessRule(
                "cannot book a temporary activity instance; book its template".to_string(),
            ));
        }

        let instance = self
            .activities
            .clone_template(&template, data.owner_id, &data.items)
            .await?;

        let booking = self
            .repository
            .bookings
            .create(
                instance.id,
                data.owner_id,
                &data.location,
                data.comments.as_deref(),
                data.start_time,
                data.end_time,
            )
            .await?;

        let extras = if instance.special() {
            " (with extra requisitions)"
        } else {
            ""
        };
        self.notify_technicians(
            "New booking request",
            &format!(
                "{} requested at {}{}",
                template.title,
                booking.start_time.format("%Y-%m-%d %H:%M"),
                extras
            ),
            Severity::Important,
        )
        .await?;

        Ok(booking)
    }

    pub async fn get(&self, id: i32) -> AppResult<Booking> {
        self.repository.bookings.get_by_id(id).await
    }

    pub async fn list(&self) -> AppResult<Vec<Booking>> {
        self.repository.bookings.list().await
    }

    pub async fn range(
        &self,
        start: chrono::DateTime<Utc>,
        end: chrono::DateTime<Utc>,
    ) -> AppResult<Vec<Booking>> {
        self.repository.bookings.range(start, end).await
    }

    pub async fn by_status(&self, status: BookingStatus) -> AppResult<Vec<Booking>> {
        self.repository.bookings.by_status(status).await
    }

    pub async fn personal(&self, owner_id: i32) -> AppResult<Vec<Booking>> {
        self.repository.bookings.personal(owner_id).await
    }

    pub async fn personal_range(
        &self,
        owner_id: i32,
        start: chrono::DateTime<Utc>,
        end: chrono::DateTime<Utc>,
    ) -> AppResult<Vec<Booking>> {
        self.repository
            .bookings
            .personal_range(owner_id, start, end)
            .await
    }

    /// Every booking currently running, at minute resolution.
    pub async fn ongoing(&self) -> AppResult<Vec<Booking>> {
        let now = Utc::now();
        let candidates = self.repository.bookings.ongoing_candidates(None, now).await?;
        Ok(candidates.into_iter().filter(|b| b.is_ongoing(now)).collect())
    }

    /// The booking a user is currently in, if any. Earliest ongoing wins.
    pub async fn current(&self, owner_id: i32) -> AppResult<Booking> {
        let now = Utc::now();
        let candidates = self
            .repository
            .bookings
            .ongoing_candidates(Some(owner_id), now)
            .await?;
        candidates
            .into_iter()
            .find(|b| b.is_ongoing(now))
            .ok_or_else(|| {
                AppError::NotFound(format!("No ongoing booking for user {}", owner_id))
            })
    }

    /// Amend a booking's details and requisitions. Only allowed while the
    /// booking is unfinalized and at least an hour away.
    pub async fn amend(&self, id: i32, data: &AmendBooking) -> AppResult<Booking> {
        let booking = self.repository.bookings.get_by_id(id).await?;
        if !booking.may_amend(Utc::now()) {
            return Err(AppError::BusinessRule(
                "booking can no longer be amended: it is finalized or starts within the hour"
                    .to_string(),
            ));
        }

        booking
            .validate_amend_window(data.start_time, data.end_time)
            .map_err(AppError::Validation)?;

        let updated = self
            .repository
            .bookings
            .update_details(
                id,
                data.location.as_deref(),
                data.comments.as_deref(),
                data.start_time,
                data.end_time,
            )
            .await?;

        if !data.items.is_empty() {
            self.rewrite_requisitions(booking.activity_id, &data.items).await?;
        }

        self.notify_technicians(
            "Booking amended",
            &format!("Booking {} was amended by its owner", id),
            Severity::Important,
        )
        .await?;

        Ok(updated)
    }

    /// Move a booking later in time. Earlier targets are refused; the
    /// status is forced so technicians re-review the new window.
    pub async fn postpone(&self, id: i32, data: &PostponeBooking) -> AppResult<Booking> {
        let booking = self.repository.bookings.get_by_id(id).await?;
        booking
            .validate_postpone(data.start_time, data.end_time)
            .map_err(AppError::BusinessRule)?;

        let updated = self
            .repository
            .bookings
            .update_window_status(id, data.start_time, data.end_time, booking.postponed_status())
            .await?;

        self.notify_technicians(
            "Booking postponed",
            &format!(
                "Booking {} moved to {}",
                id,
                data.start_time.format("%Y-%m-%d %H:%M")
            ),
            Severity::Important,
        )
        .await?;

        Ok(updated)
    }

    /// Set the status of a booking and tell its owner.
    pub async fn set_status(&self, id: i32, status: BookingStatus) -> AppResult<Booking> {
        let updated = self.repository.bookings.set_status(id, status).await?;

        let (title, severity) = match status {
            BookingStatus::Ready => ("Booking ready", Severity::Success),
            BookingStatus::Rejected => ("Booking rejected", Severity::Danger),
            BookingStatus::InProgress => ("Booking in progress", Severity::Generic),
            BookingStatus::Pending => ("Booking pending", Severity::Generic),
        };
        self.notifications.push_user(
            updated.owner_id,
            Notification {
                title: title.to_string(),
                body: format!("Booking {} is now {:?}", id, status),
                action: format!("/book/booking/{}", id),
                time: Utc::now(),
                severity,
            },
        );

        Ok(updated)
    }

    /// Delete a booking. Its temporary activity and requisitions go with
    /// it; a template referenced by mistake survives.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let booking = self.repository.bookings.get_by_id(id).await?;
        self.repository.bookings.delete_cascade(id).await?;

        self.notify_technicians(
            "Booking cancelled",
            &format!(
                "Booking {} for {} was cancelled",
                id,
                booking.start_time.format("%Y-%m-%d %H:%M")
            ),
            Severity::Danger,
        )
        .await?;

        Ok(())
    }

    /// Replace a temporary activity's requisitions with the submitted list.
    /// Entries absent from the list are removed.
    async fn rewrite_requisitions(
        &self,
        activity_id: i32,
        items: &[ItemRequest],
    ) -> AppResult<()> {
        let mut activity = self.repository.activities.get_by_id(activity_id).await?;

        for set in &mut activity.equipment {
            set.quantity = 0;
        }
        activity.merge_requests(items);

        for set in &activity.equipment {
            self.repository
                .activities
                .write_set(activity_id, set.item_id, set.quantity, set.important)
                .await?;
        }
        Ok(())
    }

    async fn notify_technicians(
        &self,
        title: &str,
        body: &str,
        severity: Severity,
    ) -> AppResult<()> {
        let technicians = self.repository.users.technician_ids().await?;
        let time = Utc::now();
        for user in technicians {
            self.notifications.push_user(
                user,
                Notification {
                    title: title.to_string(),
                    body: body.to_string(),
                    action: "/tasks/".to_string(),
                    time,
                    severity,
                },
            );
        }
        Ok(())
    }
}
