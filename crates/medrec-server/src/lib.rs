//! HTTP API for the medical records system.
//!
//! - [`config`]: figment-based configuration
//! - [`logging`]: tracing subscriber setup
//! - [`api`]: axum router, middleware and handlers

pub mod api;
pub mod config;
pub mod logging;

pub use api::{build_router, AppState};
pub use config::{AppConfig, ConfigLoader};
