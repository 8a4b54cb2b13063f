//! Preproom Equipment Booking Engine
//!
//! A REST JSON API for school science departments: an equipment inventory
//! with time-aware availability, reusable activity templates, and a booking
//! lifecycle with clash detection and retention sweeps.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
