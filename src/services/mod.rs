//! Business logic services

pub mod activities;
pub mod bookings;
pub mod inventory;
pub mod maintenance;
pub mod notifications;
pub mod reservation;

use std::sync::Arc;

use crate::{config::RetentionConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub inventory: inventory::InventoryService,
    pub activities: activities::ActivitiesService,
    pub reservation: reservation::ReservationService,
    pub bookings: bookings::BookingsService,
    pub maintenance: maintenance::MaintenanceService,
    pub notifications: Arc<notifications::NotificationStore>,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, retention: RetentionConfig) -> Self {
        let notifications = Arc::new(notifications::NotificationStore::new());
        let manager = Arc::new(maintenance::MaintenanceManager::new());

        Self {
            inventory: inventory::InventoryService::new(repository.clone()),
            activities: activities::ActivitiesService::new(repository.clone()),
            reservation: reservation::ReservationService::new(repository.clone()),
            bookings: bookings::BookingsService::new(repository.clone(), notifications.clone()),
            maintenance: maintenance::MaintenanceService::new(repository, manager, retention),
            notifications,
        }
    }

    /// Handle on the maintenance flag, for the request gate middleware.
    pub fn maintenance_manager(&self) -> Arc<maintenance::MaintenanceManager> {
        self.maintenance.manager()
    }
}
