//! Core utilities: configuration, errors, logging and the web server

pub mod config;
pub mod error;
pub mod logging;
pub mod web_server;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult};
pub use logging::init_logger;
