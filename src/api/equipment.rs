//! Equipment inventory endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{
    error::{AppError, AppResult},
    models::equipment::{CreateEquipmentItem, EquipmentItem, UpdateEquipmentItem},
    services::inventory::AnnotatedItem,
};

use super::validate_payload;

/// Optional window for usage annotations. Both bounds or neither.
#[derive(Deserialize, IntoParams)]
pub struct WindowQuery {
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl WindowQuery {
    fn window(&self) -> AppResult<Option<(DateTime<Utc>, DateTime<Utc>)>> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if end > start => Ok(Some((start, end))),
            (Some(_), Some(_)) => Err(AppError::Validation(
                "end time must be after start time".to_string(),
            )),
            (None, None) => Ok(None),
            _ => Err(AppError::Validation(
                "start_time and end_time must be given together".to_string(),
            )),
        }
    }
}

/// List all equipment items
#[utoipa::path(
    get,
    path = "/equipment",
    tag = "equipment",
    responses(
        (status = 200, description = "All live inventory items", body = Vec<EquipmentItem>)
    )
)]
pub async fn list_equipment(
    State(state): State<crate::AppState>,
) -> AppResult<Json<Vec<EquipmentItem>>> {
    let items = state.services.inventory.list().await?;
    Ok(Json(items))
}

/// Get one item annotated with its usage over a window
#[utoipa::path(
    get,
    path = "/equipment/{id}",
    tag = "equipment",
    params(
        ("id" = i32, Path, description = "Equipment item ID"),
        WindowQuery
    ),
    responses(
        (status = 200, description = "Item with usage annotations", body = AnnotatedItem),
        (status = 404, description = "Item not found")
    )
)]
pub async fn get_equipment(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Query(query): Query<WindowQuery>,
) -> AppResult<Json<AnnotatedItem>> {
    let annotated = state
        .services
        .inventory
        .annotated(id, query.window()?)
        .await?;
    Ok(Json(annotated))
}

/// Add an item to the inventory
#[utoipa::path(
    post,
    path = "/equipment",
    tag = "equipment",
    request_body = CreateEquipmentItem,
    responses(
        (status = 201, description = "Item created", body = EquipmentItem),
        (status = 400, description = "Invalid request")
    )
)]
pub async fn create_equipment(
    State(state): State<crate::AppState>,
    Json(request): Json<CreateEquipmentItem>,
) -> AppResult<(StatusCode, Json<EquipmentItem>)> {
    validate_payload(&request)?;
    let item = state.services.inventory.create(&request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// Update an item's details, stock level or flags
#[utoipa::path(
    put,
    path = "/equipment/{id}",
    tag = "equipment",
    params(
        ("id" = i32, Path, description = "Equipment item ID")
    ),
    request_body = UpdateEquipmentItem,
    responses(
        (status = 200, description = "Item updated", body = EquipmentItem),
        (status = 404, description = "Item not found")
    )
)]
pub async fn update_equipment(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
    Json(request): Json<UpdateEquipmentItem>,
) -> AppResult<Json<EquipmentItem>> {
    validate_payload(&request)?;
    let item = state.services.inventory.update(id, &request).await?;
    Ok(Json(item))
}

/// Remove an item from the inventory
#[utoipa::path(
    delete,
    path = "/equipment/{id}",
    tag = "equipment",
    params(
        ("id" = i32, Path, description = "Equipment item ID")
    ),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Item not found")
    )
)]
pub async fn delete_equipment(
    State(state): State<crate::AppState>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.services.inventory.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
