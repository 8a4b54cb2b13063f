//! Maintenance endpoints
//!
//! These routes sit outside the maintenance gate so the status stays
//! readable while a sweep runs.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{error::AppResult, services::maintenance::SweepReport};

#[derive(Serialize, ToSchema)]
pub struct MaintenanceStatus {
    /// Whether a sweep currently holds the maintenance flag
    pub active: bool,
}

/// Report whether maintenance mode is active
#[utoipa::path(
    get,
    path = "/maintenance",
    tag = "maintenance",
    responses(
        (status = 200, description = "Current maintenance state", body = MaintenanceStatus)
    )
)]
pub async fn maintenance_status(
    State(state): State<crate::AppState>,
) -> Json<MaintenanceStatus> {
    Json(MaintenanceStatus {
        active: state.services.maintenance_manager().is(),
    })
}

/// Trigger a retention sweep immediately
#[utoipa::path(
    post,
    path = "/maintenance/sweep",
    tag = "maintenance",
    responses(
        (status = 200, description = "Sweep finished", body = SweepReport),
        (status = 409, description = "A sweep is already running")
    )
)]
pub async fn trigger_sweep(
    State(state): State<crate::AppState>,
) -> AppResult<Json<SweepReport>> {
    let report = state.services.maintenance.run_sweep().await?;
    Ok(Json(report))
}
