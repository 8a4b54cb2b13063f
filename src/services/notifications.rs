//! In-process notification queues
//!
//! Fire-and-forget delivery: the booking engine pushes and never cares
//! whether anyone is listening. Each user gets a bounded FIFO queue; pushes
//! beyond the cap are dropped silently.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Length at which a user's queue begins rejecting new entries.
const MAX_QUEUE_LENGTH: usize = 15;

/// Visual severity of a notification on the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Normal white background.
    Generic,
    /// Primary background.
    Important,
    /// Bright red background. Usually for rejected requests.
    Danger,
    /// Bright green background.
    Success,
}

/// A single entry in a user's notification queue.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    /// Link the client should offer for follow-up.
    pub action: String,
    pub time: DateTime<Utc>,
    pub severity: Severity,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PopError {
    /// The user has never received a notification.
    #[error("no such user")]
    NoSuchUser,
    /// The queue exists but has been drained.
    #[error("queue empty")]
    EmptyQueue,
}

/// Map between user IDs and their notification queues. All operations are
/// thread safe.
#[derive(Debug, Default)]
pub struct NotificationStore {
    inner: Mutex<HashMap<i32, VecDeque<Notification>>>,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a notification onto the given user's queue, fabricating the
    /// queue on first use. Returns the new queue length; a full queue drops
    /// the entry and reports its unchanged length.
    pub fn push_user(&self, user: i32, notification: Notification) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let queue = inner.entry(user).or_default();

        if queue.len() >= MAX_QUEUE_LENGTH {
            return queue.len();
        }

        queue.push_back(notification);
        queue.len()
    }

    /// Pop the oldest notification off the given user's queue. Distinguishes
    /// a user who has never been pushed to from one whose queue is drained.
    pub fn pop_user(&self, user: i32) -> Result<Notification, PopError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        let queue = inner.get_mut(&user).ok_or(PopError::NoSuchUser)?;
        queue.pop_front().ok_or(PopError::EmptyQueue)
    }

    /// Number of entries waiting for the given user.
    pub fn len(&self, user: i32) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.get(&user).map(VecDeque::len).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(title: &str) -> Notification {
        Notification {
            title: title.to_string(),
            body: String::new(),
            action: "/tasks/".to_string(),
            time: Utc::now(),
            severity: Severity::Generic,
        }
    }

    #[test]
    fn push_pop_fifo() {
        let store = NotificationStore::new();
        assert_eq!(store.push_user(1, note("a")), 1);
        assert_eq!(store.push_user(1, note("b")), 2);

        assert_eq!(store.pop_user(1).unwrap().title, "a");
        assert_eq!(store.pop_user(1).unwrap().title, "b");
        assert_eq!(store.pop_user(1), Err(PopError::EmptyQueue));
    }

    #[test]
    fn unknown_user_is_distinct_from_drained_queue() {
        let store = NotificationStore::new();
        assert_eq!(store.pop_user(9), Err(PopError::NoSuchUser));

        store.push_user(9, note("x"));
        store.pop_user(9).unwrap();
        assert_eq!(store.pop_user(9), Err(PopError::EmptyQueue));
    }

    #[test]
    fn full_queue_drops_silently() {
        let store = NotificationStore::new();
        for i in 0..MAX_QUEUE_LENGTH {
            assert_eq!(store.push_user(2, note("n")), i + 1);
        }
        assert_eq!(store.push_user(2, note("overflow")), MAX_QUEUE_LENGTH);
        assert_eq!(store.len(2), MAX_QUEUE_LENGTH);
    }
}
