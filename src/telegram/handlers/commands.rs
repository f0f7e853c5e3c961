//! Command handler implementations (/start, /list_files)

use teloxide::prelude::*;
use teloxide::types::Message;

use super::types::{HandlerDeps, HandlerError};
use crate::storage::meta::UploadRecord;
use crate::telegram::Bot;

const GREETING: &str =
    "Hi! Send me a file to archive it. Admins can review uploads with /list_files.";
const NOT_ADMIN: &str = "You are not an admin.";
const NOTHING_UPLOADED: &str = "Nothing has been uploaded yet.";

/// Handle /start command
pub(super) async fn handle_start_command(bot: &Bot, msg: &Message) -> Result<(), HandlerError> {
    bot.send_message(msg.chat.id, GREETING).await?;
    Ok(())
}

/// Handle /list_files command (admin-gated)
pub(super) async fn handle_list_files_command(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
) -> Result<(), HandlerError> {
    let user_id = msg.from.as_ref().and_then(|u| i64::try_from(u.id.0).ok()).unwrap_or(0);

    if !deps.config.is_admin(user_id) {
        bot.send_message(msg.chat.id, NOT_ADMIN).await?;
        return Ok(());
    }

    let records = deps.meta.list_all().await?;
    bot.send_message(msg.chat.id, format_file_listing(&records)).await?;
    Ok(())
}

/// Renders the upload listing sent to admins: a 1-indexed
/// `file_name — url` line per record, in store order.
pub fn format_file_listing(records: &[UploadRecord]) -> String {
    if records.is_empty() {
        return NOTHING_UPLOADED.to_string();
    }

    let lines = records
        .iter()
        .enumerate()
        .map(|(i, record)| format!("{}. {} — {}", i + 1, record.file_name, record.url))
        .collect::<Vec<_>>()
        .join("\n");

    format!("Files:\n{lines}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::backend::StorageMode;
    use pretty_assertions::assert_eq;

    fn record(name: &str, url: &str) -> UploadRecord {
        UploadRecord {
            file_name: name.to_string(),
            uploader_id: 1,
            storage: StorageMode::S3,
            url: url.to_string(),
        }
    }

    #[test]
    fn test_empty_listing_message() {
        assert_eq!(format_file_listing(&[]), NOTHING_UPLOADED);
    }

    #[test]
    fn test_listing_is_one_indexed_and_ordered() {
        let records = vec![
            record("a.pdf", "https://books.s3.us-east-1.amazonaws.com/a.pdf"),
            record("b.pdf", "https://books.s3.us-east-1.amazonaws.com/b.pdf"),
        ];

        assert_eq!(
            format_file_listing(&records),
            "Files:\n\
             1. a.pdf — https://books.s3.us-east-1.amazonaws.com/a.pdf\n\
             2. b.pdf — https://books.s3.us-east-1.amazonaws.com/b.pdf"
        );
    }
}
