//! Core types, configuration, and utilities shared by the studio client crates.

mod api;
mod config;
mod error;
mod logging;
mod paths;

pub use api::{ApiError, ApiResponse};
pub use config::{Config, DEFAULT_API_KEY, DEFAULT_BACKEND_URL, DEFAULT_LOG_LEVEL, DEFAULT_REST_URL};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, init_logging_for_service, parse_level};
pub use paths::Paths;
