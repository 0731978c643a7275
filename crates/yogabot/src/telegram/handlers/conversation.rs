//! Free text in private chats: the email fallback

use teloxide::prelude::*;
use unic_langid::LanguageIdentifier;

use super::replies::send_access;
use super::types::{identity_from_user, HandlerDeps, HandlerError};
use crate::i18n::t;
use crate::telegram::Bot;
use yogacore::onboarding::EmailOutcome;

pub async fn handle_text_message(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
) -> Result<(), HandlerError> {
    let (Some(user), Some(text)) = (msg.from.as_ref(), msg.text()) else {
        return Ok(());
    };
    let identity = identity_from_user(user);

    match deps.onboarding.submit_email(&identity, text).await? {
        EmailOutcome::Verified { account, access } => {
            log::info!(
                "Email fallback matched telegram user {} to account {}",
                identity.telegram_id,
                account.account_id
            );
            send_access(bot, msg.chat.id, lang, deps, &account, &access).await?;
        }
        EmailOutcome::NotFound => {
            bot.send_message(msg.chat.id, t(lang, "email-not-found")).await?;
        }
        EmailOutcome::Malformed => {
            bot.send_message(msg.chat.id, t(lang, "email-malformed")).await?;
        }
        EmailOutcome::NotAwaiting => {
            bot.send_message(msg.chat.id, t(lang, "help")).await?;
        }
    }
    Ok(())
}
