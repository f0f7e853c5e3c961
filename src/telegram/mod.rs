//! Telegram bot integration and handlers

pub mod bot;
pub mod handlers;

/// The concrete bot type used throughout the crate.
pub type Bot = teloxide::Bot;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
