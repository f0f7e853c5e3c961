//! Arkivbot — Telegram bot that archives document uploads
//!
//! Receives updates over a webhook, stages uploaded documents locally,
//! pushes them to the configured storage backend (local disk, S3 or
//! Supabase Storage), records each upload in a JSON metadata store and
//! serves the files back over HTTP.
//!
//! # Module Structure
//!
//! - `core`: configuration, errors, logging and the web server
//! - `storage`: metadata store and storage backends
//! - `telegram`: bot construction and update handlers

pub mod cli;
pub mod core;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use self::core::{config, AppError, AppResult};
pub use self::storage::{MetaStore, StorageMode, UploadRecord};
pub use self::telegram::{schema, HandlerDeps};
