//! Command handlers

use teloxide::prelude::*;
use unic_langid::LanguageIdentifier;

use super::replies::{send_access, send_plans};
use super::types::{identity_from_user, telegram_id, HandlerDeps, HandlerError};
use crate::i18n::{arg, t, t_args};
use crate::telegram::Bot;
use yogacore::onboarding::{EmailPromptReason, MemberStatus, StartOutcome};

/// `/start [order_token]`
pub async fn handle_start_command(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
    token: Option<&str>,
) -> Result<(), HandlerError> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let identity = identity_from_user(user);
    log::info!(
        "/start from {} ({}), token present: {}",
        identity.telegram_id,
        identity.full_name,
        token.is_some()
    );

    match deps.onboarding.start(&identity, token).await? {
        StartOutcome::Verified { account, access } => {
            send_access(bot, msg.chat.id, lang, deps, &account, &access).await?;
        }
        StartOutcome::AwaitingEmail {
            reason: EmailPromptReason::NoToken,
        } => {
            let welcome = t_args(lang, "welcome", &[arg("name", user.first_name.clone())]);
            send_plans(bot, msg.chat.id, lang, deps, welcome).await?;
            bot.send_message(msg.chat.id, t(lang, "email-prompt")).await?;
        }
        StartOutcome::AwaitingEmail {
            reason: EmailPromptReason::TokenNotFound,
        } => {
            bot.send_message(msg.chat.id, t(lang, "token-not-found")).await?;
        }
    }
    Ok(())
}

/// `/plans`
pub async fn handle_plans_command(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
) -> Result<(), HandlerError> {
    if let Some(user) = msg.from.as_ref() {
        deps.onboarding.register(&identity_from_user(user))?;
    }
    send_plans(bot, msg.chat.id, lang, deps, t(lang, "plans-title")).await
}

/// `/status`
pub async fn handle_status_command(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
) -> Result<(), HandlerError> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };

    let text = match deps.onboarding.status(telegram_id(user))? {
        Some(status) => format_status(lang, &status),
        None => t(lang, "status-unknown"),
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// `/cancel`
pub async fn handle_cancel_command(
    bot: &Bot,
    msg: &Message,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
) -> Result<(), HandlerError> {
    let key = if deps.onboarding.cancel(msg.chat.id.0) {
        "cancel-done"
    } else {
        "cancel-nothing"
    };
    bot.send_message(msg.chat.id, t(lang, key)).await?;
    Ok(())
}

/// `/help`
pub async fn handle_help_command(bot: &Bot, msg: &Message, lang: &LanguageIdentifier) -> Result<(), HandlerError> {
    bot.send_message(msg.chat.id, t(lang, "help")).await?;
    Ok(())
}

fn format_status(lang: &LanguageIdentifier, status: &MemberStatus) -> String {
    let subscription = if status.entitled {
        match status
            .latest_subscription
            .as_ref()
            .filter(|s| s.is_active())
            .and_then(|s| s.expire_at.clone())
        {
            Some(date) => t_args(lang, "status-active-until", &[arg("date", date)]),
            None => t(lang, "status-active"),
        }
    } else {
        t(lang, "status-inactive")
    };
    let membership = t(lang, if status.member { "status-member" } else { "status-not-member" });

    t_args(
        lang,
        "status-report",
        &[
            arg("account", status.account.account_id),
            arg("subscription", subscription),
            arg("membership", membership),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::lang_from_code;
    use yogacore::storage::accounts::Account;
    use yogacore::storage::subscriptions::Subscription;

    fn status(entitled: bool, member: bool) -> MemberStatus {
        MemberStatus {
            account: Account {
                account_id: 42,
                telegram_id: Some(777),
                full_name: Some("Maria".into()),
                username: None,
                email: None,
                linked_account_id: None,
            },
            entitled,
            member,
            latest_subscription: Some(Subscription {
                subscription_id: 1,
                account_id: 42,
                plan_id: 1,
                status: if entitled { "active" } else { "expired" }.into(),
                created_at: "2024-03-01 12:00:00".into(),
                expire_at: Some("2024-03-31 12:00:00".into()),
            }),
        }
    }

    #[test]
    fn status_report_for_active_member() {
        let text = format_status(&lang_from_code(Some("en")), &status(true, true));
        assert_eq!(
            text,
            "Account #42\nSubscription: active until 2024-03-31 12:00:00\nGroup: you are a member"
        );
    }

    #[test]
    fn status_report_without_subscription() {
        let text = format_status(&lang_from_code(Some("en")), &status(false, false));
        assert!(text.contains("no active subscription"));
        assert!(text.contains("access not granted"));
    }
}
