//! Community group events: greetings and the access journal

use teloxide::prelude::*;
use teloxide::types::User;

use super::types::{telegram_id, user_lang, HandlerDeps, HandlerError};
use crate::i18n::{arg, t_args};
use crate::telegram::Bot;
use yogacore::get_connection;
use yogacore::storage::access_log::{self, AccessAction};
use yogacore::storage::accounts::find_by_telegram_id;
use yogacore::storage::memberships::{record_group_event, MembershipAction};

pub async fn handle_group_message(bot: &Bot, msg: &Message, deps: &HandlerDeps) -> Result<(), HandlerError> {
    if let Some(members) = msg.new_chat_members() {
        for member in members.iter().filter(|m| !m.is_bot) {
            record(deps, member, AccessAction::Joined, None)?;
            let lang = user_lang(Some(member));
            bot.send_message(msg.chat.id, t_args(&lang, "group-welcome", &[arg("name", member.full_name())]))
                .await?;
        }
        return Ok(());
    }

    if let Some(member) = msg.left_chat_member() {
        if !member.is_bot {
            record(deps, member, AccessAction::Left, None)?;
            let lang = user_lang(Some(member));
            bot.send_message(msg.chat.id, t_args(&lang, "group-goodbye", &[arg("name", member.full_name())]))
                .await?;
        }
        return Ok(());
    }

    if let Some(user) = msg.from.as_ref() {
        record(deps, user, AccessAction::Message, msg.text())?;
    }
    Ok(())
}

/// Appends to the journal and, for joins and leaves of bound accounts,
/// updates the membership row.
fn record(deps: &HandlerDeps, user: &User, action: AccessAction, text: Option<&str>) -> Result<(), HandlerError> {
    let conn = get_connection(&deps.db_pool)?;
    let user_id = telegram_id(user);
    access_log::append(&conn, user_id, deps.group_id, action, text)?;

    let membership_action = match action {
        AccessAction::Joined => MembershipAction::Joined,
        AccessAction::Left => MembershipAction::Left,
        AccessAction::Message => return Ok(()),
    };
    if let Some(account) = find_by_telegram_id(&conn, user_id)? {
        if !record_group_event(&conn, deps.group_id, account.account_id, membership_action)? {
            log::info!("Telegram user {} {} without an admission record", user_id, action);
        }
    }
    Ok(())
}
