//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::Message;

use super::commands::{handle_list_files_command, handle_start_command};
use super::documents::document_handler;
use super::types::{HandlerDeps, HandlerError};
use crate::telegram::bot::Command;
use crate::telegram::Bot;

/// Creates the main dispatcher schema for the bot.
///
/// The returned handler tree is dispatched once per webhook update and is
/// the same tree integration tests run against.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_commands = deps.clone();
    let deps_documents = deps;

    dptree::entry()
        // A message carrying a document is an upload no matter what its
        // caption says, so the document branch wins over commands
        .branch(document_handler(deps_documents))
        .branch(command_handler(deps_commands))
}

/// Handler for bot commands (/start, /list_files)
fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command: {:?} from chat {}", cmd, msg.chat.id);

                match cmd {
                    Command::Start => {
                        handle_start_command(&bot, &msg).await?;
                    }
                    Command::ListFiles => {
                        handle_list_files_command(&bot, &msg, &deps).await?;
                    }
                }
                Ok(())
            }
        },
    ))
}
