//! API handlers for Preproom REST endpoints

pub mod activities;
pub mod bookings;
pub mod dashboard;
pub mod equipment;
pub mod health;
pub mod maintenance;
pub mod openapi;
pub mod reservations;

use axum::{extract::State, middleware::Next, response::Response};
use validator::Validate;

use crate::{error::AppError, AppState};

/// Gate every data route behind the maintenance flag. While a sweep holds
/// the flag the API answers 503 so clients retry after the window.
pub async fn maintenance_gate(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: Next,
) -> Result<Response, AppError> {
    if state.services.maintenance_manager().is() {
        return Err(AppError::Maintenance(
            "server is undergoing maintenance, retry shortly".to_string(),
        ));
    }
    Ok(next.run(request).await)
}

/// Run a payload's declared validations, mapping failures to a 400.
pub(crate) fn validate_payload<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))
}
