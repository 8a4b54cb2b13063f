//! Booking lifecycle endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    models::booking::{AmendBooking, Booking, BookingStatus, CreateBooking, PostponeBooking},
};

use super::validate_payload;

/// Filters for the booking listing. `status` and the window are mutually
/// exclusive; neither returns everything.
#[derive(Deserialize, IntoParams)]
pub struct ListQuery {
    pub status: Option<BookingStatus>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Status change payload
#[derive(Deserialize, ToSchema)]
pub struct SetStatusRequest {
    pub status: BookingStatus,
}

/// List bookings, optionally filtered by status or start window
#[utoipa::path(
    get,
    path = "/bookings",
    tag = "bookings",
    params(ListQuery),
    responses(
        (status = 200, description = "Matching bookings, earliest first", body = Vec<Booking>),
        (status = 400, description = "Conflicting filters")
    )
)]
pub async fn list_bookings(
    State(state): State<crate::AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    let bookings = match (query.status, query.start_time, query.end_time) {
        (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
            return Err(AppError::BadRequest(
                "filter by status or by window, not both".to_string(),
            ))
        }
        (Some(status), None, None) => state.services.bookings.by_status(status).await?,
        (None, Some(start), Some(end)) => state.services.bookings.range(start, end).await?,
        (None, None, None) => state.services.bookings.list().await?,
        _ => {
            return Err(AppError::BadRequest(
                "start_time and end_time must be given together".to_string(),
            ))
        }
    };
    Ok(Json(bookings))
}

/// Bookings running right now, at minute resolution
#[utoipa::path(
    get,
    path = "/bookings/ongoing",
    tag = "bookings",
    responses(
        (status = 200, description = "Currently running bookings", body = Vec<Booking>)
    )
)]
pub async fn ongoing_bookings(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Booking>>> {
    let bookings = state.services.bookings.ongoing().await?;
    Ok(Json(bookings))
}

/// Get one booking
#[utoipa::path(
    get,
    path = "/bookings/{id}",
    tag = "bookings",
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking found", body = Booking),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn get_booking(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Booking>> {
    let booking = state.services.bookings.get(id).await?;
    Ok(Json(booking))
}

/// Book a template activity
#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    request_body = CreateBooking,
    responses(
        (status = 201, description = "Booking created with a fresh activity instance", body = Booking),
        (status = 400, description = "Invalid window or quantities"),
        (status = 404, description = "Template not found"),
        (status = 422, description = "Target activity is not a template")
    )
)]
pub async fn create_booking(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateBooking>,
) -> AppResult<(StatusCode, Json<Booking>)> {
    validate_payload(&request)?;
    let booking = state.services.bookings.create(&request).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Amend a booking's details and requisitions
#[utoipa::path(
    put,
    path = "/bookings/{id}",
    tag = "bookings",
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    request_body = AmendBooking,
    responses(
        (status = 200, description = "Booking amended", body = Booking),
        (status = 404, description = "Booking not found"),
        (status = 422, description = "Booking finalized or starting within the hour")
    )
)]
pub async fn amend_booking(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<AmendBooking>,
) -> AppResult<Json<Booking>> {
    validate_payload(&request)?;
    let booking = state.services.bookings.amend(id, &request).await?;
    Ok(Json(booking))
}

/// Postpone a booking to a later window
#[utoipa::path(
    post,
    path = "/bookings/{id}/postpone",
    tag = "bookings",
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    request_body = PostponeBooking,
    responses(
        (status = 200, description = "Booking moved", body = Booking),
        (status = 404, description = "Booking not found"),
        (status = 422, description = "Target window is earlier than the current one")
    )
)]
pub async fn postpone_booking(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<PostponeBooking>,
) -> AppResult<Json<Booking>> {
    let booking = state.services.bookings.postpone(id, &request).await?;
    Ok(Json(booking))
}

/// Set a booking's status
#[utoipa::path(
    put,
    path = "/bookings/{id}/status",
    tag = "bookings",
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    request_body = SetStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Booking),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn set_booking_status(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<SetStatusRequest>,
) -> AppResult<Json<Booking>> {
    let booking = state.services.bookings.set_status(id, request.status).await?;
    Ok(Json(booking))
}

/// Cancel a booking
#[utoipa::path(
    delete,
    path = "/bookings/{id}",
    tag = "bookings",
    params(
        ("id" = i32, Path, description = "Booking ID")
    ),
    responses(
        (status = 204, description = "Booking deleted, temporary activity removed with it"),
        (status = 404, description = "Booking not found")
    )
)]
pub async fn delete_booking(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.bookings.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// List one user's bookings, optionally narrowed to a start window
#[utoipa::path(
    get,
    path = "/users/{id}/bookings",
    tag = "bookings",
    params(
        ("id" = i32, Path, description = "User ID"),
        ListQuery
    ),
    responses(
        (status = 200, description = "The user's bookings", body = Vec<Booking>)
    )
)]
pub async fn personal_bookings(
    State(state): State<crate::AppState>,
    Path(user_id): Path<i32>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Booking>>> {
    let bookings = match (query.start_time, query.end_time) {
        (Some(start), Some(end)) => {
            state
                .services
                .bookings
                .personal_range(user_id, start, end)
                .await?
        }
        (None, None) => state.services.bookings.personal(user_id).await?,
        _ => {
            return Err(AppError::BadRequest(
                "start_time and end_time must be given together".to_string(),
            ))
        }
    };
    Ok(Json(bookings))
}

/// The booking a user is currently in
#[utoipa::path(
    get,
    path = "/users/{id}/bookings/current",
    tag = "bookings",
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "The ongoing booking", body = Booking),
        (status = 404, description = "No ongoing booking for this user")
    )
)]
pub async fn current_booking(
    State(state): State<crate::AppState>,
    Path(user_id): Path<i32>,
) -> AppResult<Json<Booking>> {
    let booking = state.services.bookings.current(user_id).await?;
    Ok(Json(booking))
}
