//! Environment-sourced configuration
//!
//! All settings are read once at startup into an explicit [`Config`] value
//! that is passed to handlers through their dependency struct. Nothing in
//! here is ambient global state.

use std::env;
use std::path::PathBuf;

use crate::core::error::{AppError, AppResult};
use crate::storage::backend::StorageMode;

/// Network configuration
pub mod network {
    use std::time::Duration;

    /// Request timeout for Telegram API calls (in seconds)
    pub const REQUEST_TIMEOUT_SECS: u64 = 300;

    /// Request timeout duration
    pub fn timeout() -> Duration {
        Duration::from_secs(REQUEST_TIMEOUT_SECS)
    }
}

/// S3 backend settings (bucket, credentials, region)
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

/// Supabase Storage backend settings
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub key: String,
    pub bucket: String,
}

/// Process-wide configuration, fixed at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token. Required; startup aborts without it.
    pub bot_token: String,
    /// Which storage backend receives uploads.
    pub storage_mode: StorageMode,
    /// Present when all S3 credentials are configured.
    pub s3: Option<S3Config>,
    /// Present when the Supabase URL and service key are configured.
    pub supabase: Option<SupabaseConfig>,
    /// Public host for webhook registration, e.g. `https://bot.fly.dev`.
    /// If unset the webhook is not registered at startup.
    pub webhook_host: Option<String>,
    /// HTTP listen port.
    pub port: u16,
    /// User IDs allowed to run privileged commands. Empty means no restriction.
    pub admin_ids: Vec<i64>,
    /// Local staging directory for uploaded files.
    pub uploads_dir: PathBuf,
    /// Path of the JSON metadata store.
    pub meta_file: PathBuf,
    /// Directory served under /static.
    pub static_dir: PathBuf,
    /// Log file path for the combined logger.
    pub log_file: String,
}

impl Config {
    /// Reads configuration from the environment.
    ///
    /// # Errors
    /// Returns `AppError::Config` if `BOT_TOKEN` is missing, the storage
    /// mode is unknown, or a non-local mode lacks its credentials.
    pub fn from_env() -> AppResult<Self> {
        let bot_token =
            env::var("BOT_TOKEN").map_err(|_| AppError::Config("BOT_TOKEN is required".to_string()))?;

        let storage_mode = match env::var("STORAGE_MODE") {
            Ok(raw) => raw
                .parse::<StorageMode>()
                .map_err(|_| AppError::Config(format!("Unknown STORAGE_MODE: {raw}")))?,
            Err(_) => StorageMode::Local,
        };

        let s3 = match (env::var("S3_BUCKET"), env::var("AWS_ACCESS_KEY"), env::var("AWS_SECRET_KEY")) {
            (Ok(bucket), Ok(access_key), Ok(secret_key)) => Some(S3Config {
                bucket,
                access_key,
                secret_key,
                region: env::var("S3_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
            }),
            _ => None,
        };

        let supabase = match (env::var("SUPABASE_URL"), env::var("SUPABASE_KEY")) {
            (Ok(url), Ok(key)) => Some(SupabaseConfig {
                url: url.trim_end_matches('/').to_string(),
                key,
                bucket: env::var("SUPABASE_BUCKET").unwrap_or_else(|_| "books".to_string()),
            }),
            _ => None,
        };

        // A non-local mode without its credentials would otherwise limp
        // along recording URLs that point nowhere.
        if storage_mode == StorageMode::S3 && s3.is_none() {
            return Err(AppError::Config(
                "STORAGE_MODE=s3 requires S3_BUCKET, AWS_ACCESS_KEY and AWS_SECRET_KEY".to_string(),
            ));
        }
        if storage_mode == StorageMode::Supabase && supabase.is_none() {
            return Err(AppError::Config(
                "STORAGE_MODE=supabase requires SUPABASE_URL and SUPABASE_KEY".to_string(),
            ));
        }

        let port = env::var("PORT")
            .ok()
            .and_then(|raw| raw.parse::<u16>().ok())
            .unwrap_or(8080);

        let admin_ids = env::var("ADMIN_IDS")
            .ok()
            .map(|raw| parse_admin_ids(&raw))
            .unwrap_or_default();

        let uploads_dir =
            PathBuf::from(env::var("UPLOADS_DIR").unwrap_or_else(|_| "static/files".to_string()));
        let meta_file = PathBuf::from(env::var("META_FILE").unwrap_or_else(|_| "files.json".to_string()));
        let static_dir = PathBuf::from(env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string()));
        let log_file = env::var("LOG_FILE_PATH").unwrap_or_else(|_| "app.log".to_string());

        Ok(Self {
            bot_token,
            storage_mode,
            s3,
            supabase,
            webhook_host: env::var("WEBHOOK_HOST").ok(),
            port,
            admin_ids,
            uploads_dir,
            meta_file,
            static_dir,
            log_file,
        })
    }

    /// Whether `user_id` may run privileged commands.
    /// An empty admin list means everyone is allowed.
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.is_empty() || self.admin_ids.contains(&user_id)
    }

    /// Webhook URL registered with Telegram, if a public host is configured.
    pub fn webhook_url(&self) -> Option<String> {
        self.webhook_host
            .as_ref()
            .map(|host| format!("{}/webhook/{}", host.trim_end_matches('/'), self.bot_token))
    }
}

fn parse_admin_ids(raw: &str) -> Vec<i64> {
    raw.split([',', ' ', '\n', '\t'])
        .filter_map(|part| part.trim().parse::<i64>().ok())
        .collect()
}
