//! Telegram bot handler tree configuration
//!
//! This module provides the main dispatcher schema for the bot. The
//! handlers are organized so integration tests can use the same handler
//! tree as production code.

mod commands;
mod documents;
mod schema;
mod types;

pub use commands::format_file_listing;
pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
