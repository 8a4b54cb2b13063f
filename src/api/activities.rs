//! Activity template endpoints
//!
//! Only templates are managed here. Temporary instances are created and
//! destroyed by the booking lifecycle and never edited directly.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::AppResult,
    models::activity::{Activity, UpdateActivity},
};

use super::validate_payload;

/// Create template request
#[derive(Deserialize, Validate, ToSchema)]
pub struct CreateActivityRequest {
    /// Owning user
    pub owner_id: i32,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
}

/// Instance count for delete confirmation screens
#[derive(Serialize, ToSchema)]
pub struct InstanceCountResponse {
    pub template_id: i32,
    /// Bookings derived from this template which a delete would remove
    pub instances: i64,
}

/// List all template activities
#[utoipa::path(
    get,
    path = "/activities",
    tag = "activities",
    responses(
        (status = 200, description = "All template activities", body = Vec<Activity>)
    )
)]
pub async fn list_activities(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<Activity>>> {
    let templates = state.services.activities.list_templates().await?;
    Ok(Json(templates))
}

/// Distinct categories in use across templates
#[utoipa::path(
    get,
    path = "/activities/categories",
    tag = "activities",
    responses(
        (status = 200, description = "Categories in use", body = Vec<String>)
    )
)]
pub async fn list_categories(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<String>>> {
    let categories = state.services.activities.categories().await?;
    Ok(Json(categories))
}

/// Get one activity with its requisitions
#[utoipa::path(
    get,
    path = "/activities/{id}",
    tag = "activities",
    params(
        ("id" = i32, Path, description = "Activity ID")
    ),
    responses(
        (status = 200, description = "Activity found", body = Activity),
        (status = 404, description = "Activity not found")
    )
)]
pub async fn get_activity(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<Activity>> {
    let activity = state.services.activities.get(id).await?;
    Ok(Json(activity))
}

/// Create an empty template activity
#[utoipa::path(
    post,
    path = "/activities",
    tag = "activities",
    request_body = CreateActivityRequest,
    responses(
        (status = 201, description = "Template created", body = Activity),
        (status = 400, description = "Invalid request")
    )
)]
pub async fn create_activity(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateActivityRequest>,
) -> AppResult<(StatusCode, Json<Activity>)> {
    validate_payload(&request)?;
    let activity = state
        .services
        .activities
        .create_template(request.owner_id, &request.title)
        .await?;
    Ok((StatusCode::CREATED, Json(activity)))
}

/// Edit a template's details and requisition list
#[utoipa::path(
    put,
    path = "/activities/{id}",
    tag = "activities",
    params(
        ("id" = i32, Path, description = "Activity ID")
    ),
    request_body = UpdateActivity,
    responses(
        (status = 200, description = "Template updated", body = Activity),
        (status = 404, description = "Activity not found")
    )
)]
pub async fn update_activity(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateActivity>,
) -> AppResult<Json<Activity>> {
    validate_payload(&request)?;
    let activity = state.services.activities.update_template(id, &request).await?;
    Ok(Json(activity))
}

/// Count the booked instances a template delete would take with it
#[utoipa::path(
    get,
    path = "/activities/{id}/instances",
    tag = "activities",
    params(
        ("id" = i32, Path, description = "Template activity ID")
    ),
    responses(
        (status = 200, description = "Instance count", body = InstanceCountResponse),
        (status = 404, description = "Activity not found")
    )
)]
pub async fn count_instances(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<InstanceCountResponse>> {
    // 404 for a missing template before counting against it
    state.services.activities.get(id).await?;
    let instances = state.services.activities.count_instances(id).await?;
    Ok(Json(InstanceCountResponse {
        template_id: id,
        instances,
    }))
}

/// Delete a template along with every instance cloned from it
#[utoipa::path(
    delete,
    path = "/activities/{id}",
    tag = "activities",
    params(
        ("id" = i32, Path, description = "Template activity ID")
    ),
    responses(
        (status = 204, description = "Template and derived bookings deleted"),
        (status = 404, description = "Activity not found")
    )
)]
pub async fn delete_activity(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.activities.delete_template(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
