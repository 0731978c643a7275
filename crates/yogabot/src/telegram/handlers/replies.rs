//! Messages shared by several handlers

use teloxide::prelude::*;
use unic_langid::LanguageIdentifier;

use super::types::{HandlerDeps, HandlerError};
use crate::i18n::{self, arg, t, t_args};
use crate::telegram::keyboards::{invite_keyboard, plans_keyboard};
use crate::telegram::notifications::notify_admins;
use crate::telegram::Bot;
use yogacore::get_connection;
use yogacore::onboarding::Access;
use yogacore::storage::accounts::Account;
use yogacore::storage::plans::list_active_plans;

/// Sends `intro` with the plan buttons.
pub async fn send_plans(
    bot: &Bot,
    chat_id: ChatId,
    lang: &LanguageIdentifier,
    deps: &HandlerDeps,
    intro: String,
) -> Result<(), HandlerError> {
    let plans = {
        let conn = get_connection(&deps.db_pool)?;
        list_active_plans(&conn)?
    };

    if plans.is_empty() {
        bot.send_message(chat_id, format!("{}\n\n{}", intro, t(lang, "plans-empty")))
            .await?;
        return Ok(());
    }

    bot.send_message(chat_id, intro)
        .reply_markup(plans_keyboard(lang, &plans))
        .await?;
    Ok(())
}

/// Tells the user what happened after their account was identified.
pub async fn send_access(
    bot: &Bot,
    chat_id: ChatId,
    lang: &LanguageIdentifier,
    deps: &HandlerDeps,
    account: &Account,
    access: &Access,
) -> Result<(), HandlerError> {
    match access {
        Access::Admitted { invite_link } => {
            let text = t_args(lang, "access-admitted", &[arg("link", invite_link.clone())]);
            let mut request = bot.send_message(chat_id, text);
            if let Some(keyboard) = invite_keyboard(lang, invite_link) {
                request = request.reply_markup(keyboard);
            }
            request.await?;

            let name = account.full_name.clone().unwrap_or_else(|| chat_id.to_string());
            let notice = t_args(
                &i18n::DEFAULT_LANG,
                "admin-member-admitted",
                &[arg("name", name), arg("account", account.account_id)],
            );
            notify_admins(bot, &deps.admin_ids, &notice).await;
        }
        Access::AlreadyMember => {
            bot.send_message(chat_id, t(lang, "access-already-member")).await?;
        }
        Access::NotEntitled => {
            send_plans(bot, chat_id, lang, deps, t(lang, "access-not-entitled")).await?;
        }
    }
    Ok(())
}

/// Generic failure message; send errors are only logged.
pub async fn send_apology(bot: &Bot, chat_id: ChatId, lang: &LanguageIdentifier) {
    if let Err(e) = bot.send_message(chat_id, t(lang, "error-generic")).await {
        log::error!("Failed to send error message to {}: {}", chat_id, e);
    }
}
