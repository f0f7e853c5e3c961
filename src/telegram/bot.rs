//! Bot initialization and command definitions

use reqwest::ClientBuilder;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::core::config::{self, Config};
use crate::core::error::AppResult;
use crate::telegram::Bot;

/// Bot commands enum with descriptions
#[derive(BotCommands, Clone, Debug)]
#[command(rename_rule = "snake_case", description = "These commands are supported:")]
pub enum Command {
    #[command(description = "show the welcome message")]
    Start,
    #[command(description = "list uploaded files (admins only)")]
    ListFiles,
}

/// Creates a Bot instance with a request timeout suitable for file transfers
///
/// # Returns
/// * `Ok(Bot)` - Successfully created bot instance
/// * `Err(AppError)` - Failed to build the underlying HTTP client
pub fn create_bot(config: &Config) -> AppResult<Bot> {
    let client = ClientBuilder::new().timeout(config::network::timeout()).build()?;
    Ok(Bot::with_client(config.bot_token.clone(), client))
}

/// Sets up bot commands in the Telegram UI
pub async fn setup_bot_commands(bot: &Bot) -> Result<(), teloxide::RequestError> {
    bot.set_my_commands(Command::bot_commands()).await?;
    Ok(())
}
