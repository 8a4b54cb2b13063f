//! Repository layer for database operations
//!
//! All database access goes through [`Repository`], which is constructed
//! once in `main` and injected into the services. Nothing in the engine
//! reaches for ambient global state.

pub mod activities;
pub mod bookings;
pub mod cleanup;
pub mod inventory;
pub mod users;

use sqlx::{Pool, Postgres};

/// Main repository struct holding the database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub inventory: inventory::InventoryRepository,
    pub activities: activities::ActivitiesRepository,
    pub bookings: bookings::BookingsRepository,
    pub users: users::UsersRepository,
    pub cleanup: cleanup::CleanupRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            inventory: inventory::InventoryRepository::new(pool.clone()),
            activities: activities::ActivitiesRepository::new(pool.clone()),
            bookings: bookings::BookingsRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            cleanup: cleanup::CleanupRepository::new(pool.clone()),
            pool,
        }
    }
}
