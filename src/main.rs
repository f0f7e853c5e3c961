use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use teloxide::prelude::*;

use arkivbot::cli::{Cli, Commands};
use arkivbot::core::{config::Config, init_logger, web_server};
use arkivbot::storage::{create_backend, MetaStore};
use arkivbot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};

/// Main entry point for the bot
///
/// Parses CLI arguments and dispatches to the appropriate subcommand.
///
/// # Errors
/// Returns an error if initialization fails (configuration, logging,
/// webhook registration, server bind).
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // Load environment variables from .env if present
    let _ = dotenv();

    let config = Config::from_env()?;

    // Initialize logger (console + file)
    init_logger(&config.log_file)?;

    match cli.command {
        Some(Commands::ListFiles) => run_list_files(config).await,
        Some(Commands::Run) | None => run_bot(config).await,
    }
}

/// Run the bot and the public web server until shutdown.
async fn run_bot(config: Config) -> Result<()> {
    log::info!("Starting arkivbot (storage mode: {})", config.storage_mode);

    // Staging and static directories must exist before the first upload
    tokio::fs::create_dir_all(&config.uploads_dir).await?;
    tokio::fs::create_dir_all(&config.static_dir).await?;

    let config = Arc::new(config);

    let meta = Arc::new(MetaStore::new(config.meta_file.clone()));
    meta.init_if_absent().await?;

    // The active backend is selected once and shared for the process lifetime
    let backend = create_backend(&config)?;

    let bot = create_bot(&config)?;

    // Command parsing needs the bot's username, so fetch the identity once
    let me = bot.get_me().await?;
    log::info!("Bot username: {:?}, Bot ID: {}", me.username, me.id);

    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let webhook_url = config.webhook_url();
    if let Some(ref url) = webhook_url {
        // Delete any stale webhook first so registration starts clean
        let _ = bot.delete_webhook().await;
        bot.set_webhook(url::Url::parse(url)?).await?;
        log::info!("Webhook set to {}", url);
    } else {
        log::info!("WEBHOOK_HOST not set, webhook not registered");
    }

    let deps = HandlerDeps::new(Arc::clone(&config), Arc::clone(&meta), backend);
    let handler = schema(deps);

    let state = web_server::WebState {
        config: Arc::clone(&config),
        meta,
        bot: bot.clone(),
        me,
        handler,
    };

    web_server::start_web_server(state).await?;

    // Stop Telegram deliveries before the process goes away
    if webhook_url.is_some() {
        if let Err(e) = bot.delete_webhook().await {
            log::warn!("Failed to delete webhook on shutdown: {}", e);
        }
    }

    log::info!("Shutdown complete");
    Ok(())
}

/// Print the metadata store contents to stdout.
async fn run_list_files(config: Config) -> Result<()> {
    let meta = MetaStore::new(config.meta_file);
    let records = meta.list_all().await?;

    if records.is_empty() {
        println!("Nothing has been uploaded yet.");
        return Ok(());
    }

    for (i, record) in records.iter().enumerate() {
        println!(
            "{}. {} — {} [{}] (uploader {})",
            i + 1,
            record.file_name,
            record.url,
            record.storage,
            record.uploader_id
        );
    }
    Ok(())
}
