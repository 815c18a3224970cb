//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum.

use sqlx::PgPool;
use std::sync::Arc;

use crate::config::environment::EnvironmentConfig;
use crate::services::email_queue::EmailQueue;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: EnvironmentConfig,
    pub email_queue: Arc<dyn EmailQueue>,
}

impl AppState {
    pub fn new(pool: PgPool, config: EnvironmentConfig, email_queue: Arc<dyn EmailQueue>) -> Self {
        Self {
            pool,
            config,
            email_queue,
        }
    }
}
