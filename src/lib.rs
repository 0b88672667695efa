//! Association Creative administration server
//!
//! REST JSON API for a patient-support association: patients, medical
//! equipment and its loans, donors, volunteers and zakat distributions.

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

impl AppState {
    /// Build the state over an existing connection pool
    pub fn new(config: AppConfig, pool: sqlx::PgPool) -> Self {
        let repository = repository::Repository::new(pool);
        let services = services::Services::new(
            repository,
            config.auth.clone(),
            config.uploads.clone(),
        );
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}
