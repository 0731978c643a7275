//! Inline button presses

use teloxide::prelude::*;
use teloxide::types::CallbackQuery;
use unic_langid::LanguageIdentifier;

use super::replies::send_plans;
use super::types::{identity_from_user, HandlerDeps, HandlerError};
use crate::i18n::{arg, t, t_args};
use crate::telegram::callback_data::CallbackData;
use crate::telegram::keyboards::payment_keyboard;
use crate::telegram::Bot;
use yogacore::get_connection;
use yogacore::storage::plans::get_plan;

pub async fn handle_callback(
    bot: &Bot,
    q: &CallbackQuery,
    deps: &HandlerDeps,
    lang: &LanguageIdentifier,
) -> Result<(), HandlerError> {
    bot.answer_callback_query(q.id.clone()).await?;

    let chat_id = ChatId::from(q.from.id);
    let Some(data) = q.data.as_deref().and_then(CallbackData::parse) else {
        log::warn!("Unknown callback data {:?} from {}", q.data, chat_id);
        return Ok(());
    };
    let identity = identity_from_user(&q.from);

    match data {
        CallbackData::Plans => {
            send_plans(bot, chat_id, lang, deps, t(lang, "plans-title")).await?;
        }
        CallbackData::Plan(plan_id) => {
            deps.onboarding.register(&identity)?;
            let plan = {
                let conn = get_connection(&deps.db_pool)?;
                get_plan(&conn, plan_id)?
            };
            let Some(plan) = plan else {
                bot.send_message(chat_id, t(lang, "plan-not-found")).await?;
                return Ok(());
            };

            let text = t_args(
                lang,
                "plan-chosen",
                &[
                    arg("title", plan.title.clone()),
                    arg("duration", plan.duration.clone()),
                    arg("price", plan.price),
                    arg("currency", plan.currency.clone()),
                ],
            );
            let links = deps.payment_links.for_plan(plan.plan_id, identity.telegram_id);
            bot.send_message(chat_id, text)
                .reply_markup(payment_keyboard(lang, links))
                .await?;
        }
        CallbackData::Paid => {
            // Same as /start without a token: wait for the checkout email
            deps.onboarding.start(&identity, None).await?;
            bot.send_message(chat_id, t(lang, "email-prompt")).await?;
        }
    }
    Ok(())
}
