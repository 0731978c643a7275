//! Dispatcher schema and handler chain builders

use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, Message};

use super::callbacks::handle_callback;
use super::commands::{
    handle_cancel_command, handle_help_command, handle_plans_command, handle_start_command, handle_status_command,
};
use super::conversation::handle_text_message;
use super::group::handle_group_message;
use super::replies::send_apology;
use super::types::{user_lang, HandlerDeps, HandlerError};
use crate::telegram::bot::Command;
use crate::telegram::Bot;

/// Creates the main dispatcher schema for the Telegram bot.
///
/// Branch order matters: group traffic is journaled before anything else,
/// then commands, then free text in private chats, then button presses.
/// Every endpoint logs its own failures and apologises to the chat, so
/// errors never reach the dispatcher.
pub fn schema(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let deps_group = deps.clone();
    let deps_commands = deps.clone();
    let deps_messages = deps.clone();
    let deps_callback = deps;

    dptree::entry()
        .branch(group_handler(deps_group))
        .branch(command_handler(deps_commands))
        .branch(private_text_handler(deps_messages))
        .branch(callback_handler(deps_callback))
}

/// Messages in the community group
fn group_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    let group_id = deps.group_id;

    Update::filter_message()
        .filter(move |msg: Message| msg.chat.id.0 == group_id)
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                if let Err(e) = handle_group_message(&bot, &msg, &deps).await {
                    // No apology in the group, members did not address the bot
                    log::error!("Group event handling failed in {}: {}", msg.chat.id, e);
                }
                Ok(())
            }
        })
}

fn command_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message().branch(dptree::entry().filter_command::<Command>().endpoint(
        move |bot: Bot, msg: Message, cmd: Command| {
            let deps = deps.clone();
            async move {
                log::info!("Received command {:?} from chat {}", cmd, msg.chat.id);
                let lang = user_lang(msg.from.as_ref());

                let result = match &cmd {
                    Command::Start(token) => handle_start_command(&bot, &msg, &deps, &lang, token.as_deref()).await,
                    Command::Plans => handle_plans_command(&bot, &msg, &deps, &lang).await,
                    Command::Status => handle_status_command(&bot, &msg, &deps, &lang).await,
                    Command::Cancel => handle_cancel_command(&bot, &msg, &deps, &lang).await,
                    Command::Help => handle_help_command(&bot, &msg, &lang).await,
                };

                if let Err(e) = result {
                    log::error!("Command {:?} failed for chat {}: {}", cmd, msg.chat.id, e);
                    send_apology(&bot, msg.chat.id, &lang).await;
                }
                Ok(())
            }
        },
    ))
}

/// Non-command text in private chats
fn private_text_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_message()
        .filter(|msg: Message| msg.chat.is_private() && msg.text().is_some_and(|text| !text.starts_with('/')))
        .endpoint(move |bot: Bot, msg: Message| {
            let deps = deps.clone();
            async move {
                let lang = user_lang(msg.from.as_ref());
                if let Err(e) = handle_text_message(&bot, &msg, &deps, &lang).await {
                    log::error!("Text message handling failed for chat {}: {}", msg.chat.id, e);
                    send_apology(&bot, msg.chat.id, &lang).await;
                }
                Ok(())
            }
        })
}

fn callback_handler(deps: HandlerDeps) -> UpdateHandler<HandlerError> {
    Update::filter_callback_query().endpoint(move |bot: Bot, q: CallbackQuery| {
        let deps = deps.clone();
        async move {
            let lang = user_lang(Some(&q.from));
            if let Err(e) = handle_callback(&bot, &q, &deps, &lang).await {
                log::error!("Callback {:?} failed for user {}: {}", q.data, q.from.id, e);
                send_apology(&bot, ChatId::from(q.from.id), &lang).await;
            }
            Ok(())
        }
    })
}
