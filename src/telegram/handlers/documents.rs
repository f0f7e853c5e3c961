//! Document upload handler
//!
//! Any message carrying a document runs the archive pipeline: stage the
//! bytes locally, push them to the active storage backend, append an
//! upload record and confirm to the sender. A failing pipeline is logged
//! and produces no reply and no record.

use std::path::Path;

use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{Document, Message};
use tokio::io::AsyncWriteExt;

use super::types::{HandlerDeps, HandlerError};
use crate::core::error::{AppError, AppResult};
use crate::storage::meta::UploadRecord;
use crate::telegram::Bot;

/// Handler for messages with an attached document
pub(super) fn document_handler(deps: HandlerDeps) -> teloxide::dispatching::UpdateHandler<HandlerError> {
    use teloxide::dispatching::UpdateFilterExt;

    Update::filter_message()
        .filter(|msg: Message| msg.document().is_some())
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                if let Err(e) = handle_document_message(&bot, &msg, &deps).await {
                    // No failure reply goes out; this log line is the only
                    // trace of a lost upload.
                    log::error!("Document upload failed for chat {}: {}", msg.chat.id, e);
                }
                Ok(())
            }
        })
}

async fn handle_document_message(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> AppResult<()> {
    let Some(doc) = msg.document() else {
        return Ok(());
    };

    let file_name = derive_file_name(doc.file_name.as_deref(), &doc.file.id.0);
    let staging_path = deps.config.uploads_dir.join(&file_name);

    download_document(bot, doc, &staging_path).await?;
    log::info!(
        "Staged '{}' ({} bytes) from chat {}",
        file_name,
        doc.file.size,
        msg.chat.id
    );

    let url = deps.backend.store(&staging_path, &file_name).await?;

    let uploader_id = msg.from.as_ref().and_then(|u| i64::try_from(u.id.0).ok()).unwrap_or(0);
    deps.meta
        .append(UploadRecord {
            file_name: file_name.clone(),
            uploader_id,
            storage: deps.backend.mode(),
            url: url.clone(),
        })
        .await?;

    bot.send_message(
        msg.chat.id,
        format!("📚 Stored! Storage: {}\nURL: {}", deps.backend.mode(), url),
    )
    .await?;

    Ok(())
}

/// Picks the staging name for an upload: the declared file name when the
/// sender set one, otherwise a name synthesized from the Telegram file id.
/// Only the final path component is kept so an upload cannot escape the
/// staging directory. Same-named uploads overwrite each other.
fn derive_file_name(declared: Option<&str>, file_id: &str) -> String {
    declared
        .and_then(|name| Path::new(name).file_name())
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
        .unwrap_or_else(|| format!("file_{file_id}"))
}

/// Downloads the document's bytes from Telegram into the staging path.
async fn download_document(bot: &Bot, doc: &Document, dest: &Path) -> AppResult<()> {
    let file = bot.get_file(doc.file.id.clone()).await?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut dst = tokio::fs::File::create(dest).await?;
    bot.download_file(&file.path, &mut dst)
        .await
        .map_err(|e| match e {
            teloxide::DownloadError::Network(e) => AppError::Http(e),
            teloxide::DownloadError::Io(e) => AppError::Io(e),
        })?;
    dst.flush().await?;

    Ok(())
}
