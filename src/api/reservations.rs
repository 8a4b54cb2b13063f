//! Reservation clash checking endpoint
//!
//! Answers "can these items be had between T1 and T2" before a booking is
//! committed. The check is advisory: nothing is locked by asking.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult, models::activity::ItemRequest,
    services::reservation::AvailabilityReport,
};

use super::validate_payload;

/// Clash check request
#[derive(Deserialize, Validate, ToSchema)]
pub struct CheckRequest {
    #[validate(length(min = 1), nested)]
    pub items: Vec<ItemRequest>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

/// Assess a set of item requests against a time window
#[utoipa::path(
    post,
    path = "/reservations/check",
    tag = "reservations",
    request_body = CheckRequest,
    responses(
        (status = 200, description = "Availability report with per-item balances and clashes", body = AvailabilityReport),
        (status = 400, description = "Invalid window or quantities"),
        (status = 404, description = "Unknown equipment item")
    )
)]
pub async fn check_reservation(
    State(state): State<crate::AppState>,
    Json(request): Json<CheckRequest>,
) -> AppResult<Json<AvailabilityReport>> {
    validate_payload(&request)?;
    let report = state
        .services
        .reservation
        .check(&request.items, request.start_time, request.end_time)
        .await?;
    Ok(Json(report))
}
