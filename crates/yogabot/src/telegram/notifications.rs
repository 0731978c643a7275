use teloxide::prelude::*;

use crate::telegram::Bot;

/// Sends a plain text notice to every admin. Failures are logged and skipped.
pub async fn notify_admins(bot: &Bot, admin_ids: &[i64], text: &str) {
    for &admin_id in admin_ids {
        if let Err(e) = bot.send_message(ChatId(admin_id), text).await {
            log::warn!("Failed to notify admin {}: {}", admin_id, e);
        }
    }
}
