//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{
    activities, bookings, dashboard, equipment, health, maintenance, reservations,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Preproom API",
        version = "1.0.0",
        description = "Equipment reservation and booking engine REST API",
        license(name = "AGPL-3.0", url = "https://www.gnu.org/licenses/agpl-3.0.html")
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Equipment
        equipment::list_equipment,
        equipment::get_equipment,
        equipment::create_equipment,
        equipment::update_equipment,
        equipment::delete_equipment,
        // Activities
        activities::list_activities,
        activities::list_categories,
        activities::get_activity,
        activities::create_activity,
        activities::update_activity,
        activities::count_instances,
        activities::delete_activity,
        // Reservations
        reservations::check_reservation,
        // Bookings
        bookings::list_bookings,
        bookings::ongoing_bookings,
        bookings::get_booking,
        bookings::create_booking,
        bookings::amend_booking,
        bookings::postpone_booking,
        bookings::set_booking_status,
        bookings::delete_booking,
        bookings::personal_bookings,
        bookings::current_booking,
        // Dashboard
        dashboard::drain_notifications,
        // Maintenance
        maintenance::maintenance_status,
        maintenance::trigger_sweep,
    ),
    components(
        schemas(
            // Equipment
            crate::models::equipment::EquipmentItem,
            crate::models::equipment::CreateEquipmentItem,
            crate::models::equipment::UpdateEquipmentItem,
            crate::services::inventory::AnnotatedItem,
            // Activities
            crate::models::activity::Activity,
            crate::models::activity::EquipmentSet,
            crate::models::activity::ItemRequest,
            crate::models::activity::ZeroableItemRequest,
            crate::models::activity::UpdateActivity,
            activities::CreateActivityRequest,
            activities::InstanceCountResponse,
            // Reservations
            reservations::CheckRequest,
            crate::services::reservation::AvailabilityReport,
            crate::services::reservation::ItemBalance,
            crate::services::reservation::ClashRecord,
            // Bookings
            crate::models::booking::Booking,
            crate::models::booking::BookingStatus,
            crate::models::booking::CreateBooking,
            crate::models::booking::AmendBooking,
            crate::models::booking::PostponeBooking,
            bookings::SetStatusRequest,
            // Dashboard
            crate::services::notifications::Notification,
            crate::services::notifications::Severity,
            // Maintenance
            maintenance::MaintenanceStatus,
            crate::services::maintenance::SweepReport,
            // Health
            health::HealthResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "equipment", description = "Equipment inventory management"),
        (name = "activities", description = "Activity template management"),
        (name = "reservations", description = "Availability and clash checking"),
        (name = "bookings", description = "Booking lifecycle"),
        (name = "dashboard", description = "Per-user notification feed"),
        (name = "maintenance", description = "Retention sweeps and maintenance mode")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
