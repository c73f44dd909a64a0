//! SuomiSF bibliography server.
//!
//! A Rust implementation of the SuomiSF catalog backend: a JSON REST API
//! over the Finnish science-fiction and fantasy bibliography database.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}
