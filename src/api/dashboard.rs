//! Dashboard notification endpoint
//!
//! Clients poll and drain their queue in small batches. Popping is
//! destructive: a delivered notification is gone.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    error::AppResult,
    services::notifications::{Notification, PopError},
};

/// Most notifications handed out per poll.
const DRAIN_LIMIT: usize = 5;

/// Drain up to five pending notifications for a user
#[utoipa::path(
    get,
    path = "/users/{id}/notifications",
    tag = "dashboard",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Oldest pending notifications, possibly empty", body = Vec<Notification>)
    )
)]
pub async fn drain_notifications(
    State(state): State<crate::AppState>,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Vec<Notification>>> {
    let mut drained = Vec::with_capacity(DRAIN_LIMIT);
    for _ in 0..DRAIN_LIMIT {
        match state.services.notifications.pop_user(user_id) {
            Ok(notification) => drained.push(notification),
            // Both exhaustion cases end the drain; an unknown user just
            // gets an empty list.
            Err(PopError::EmptyQueue | PopError::NoSuchUser) => break,
        }
    }
    Ok(Json(drained))
}
