use async_trait::async_trait;
use teloxide::prelude::*;

use crate::telegram::Bot;
use yogacore::entitlement::InviteIssuer;
use yogacore::AppResult;

/// Creates single-use invite links through the Bot API.
///
/// The bot must be an administrator of the group with the "invite users" right.
#[derive(Clone)]
pub struct TelegramInviteIssuer {
    bot: Bot,
}

impl TelegramInviteIssuer {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl InviteIssuer for TelegramInviteIssuer {
    async fn create_single_use_invite(&self, group_id: i64, account_id: i64) -> AppResult<String> {
        let link = self
            .bot
            .create_chat_invite_link(ChatId(group_id))
            .member_limit(1)
            .name(format!("account {}", account_id))
            .await?;
        log::info!("Created single-use invite for account {} in {}", account_id, group_id);
        Ok(link.invite_link)
    }
}
