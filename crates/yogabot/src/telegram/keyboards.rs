use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use unic_langid::LanguageIdentifier;
use url::Url;

use crate::i18n::{arg, t, t_args};
use crate::telegram::callback_data::CallbackData;
use yogacore::payments::PaymentMethod;
use yogacore::storage::plans::Plan;

/// One button per plan.
pub fn plans_keyboard(lang: &LanguageIdentifier, plans: &[Plan]) -> InlineKeyboardMarkup {
    let rows = plans
        .iter()
        .map(|plan| {
            let label = t_args(
                lang,
                "plan-button",
                &[
                    arg("title", plan.title.clone()),
                    arg("duration", plan.duration.clone()),
                    arg("price", plan.price),
                    arg("currency", plan.currency.clone()),
                ],
            );
            vec![InlineKeyboardButton::callback(label, CallbackData::Plan(plan.plan_id).encode())]
        })
        .collect::<Vec<_>>();
    InlineKeyboardMarkup::new(rows)
}

/// Checkout links, then "I have paid" and a way back to the plan list.
pub fn payment_keyboard(lang: &LanguageIdentifier, links: Vec<(PaymentMethod, Url)>) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = links
        .into_iter()
        .map(|(method, url)| {
            let key = match method {
                PaymentMethod::Card => "pay-card",
                PaymentMethod::PayPal => "pay-paypal",
                PaymentMethod::BankTransfer => "pay-bank-transfer",
            };
            vec![InlineKeyboardButton::url(t(lang, key), url)]
        })
        .collect();

    rows.push(vec![InlineKeyboardButton::callback(
        t(lang, "button-paid"),
        CallbackData::Paid.encode(),
    )]);
    rows.push(vec![InlineKeyboardButton::callback(
        t(lang, "button-back"),
        CallbackData::Plans.encode(),
    )]);
    InlineKeyboardMarkup::new(rows)
}

/// Button opening the invite link, if it is a valid URL.
pub fn invite_keyboard(lang: &LanguageIdentifier, invite_link: &str) -> Option<InlineKeyboardMarkup> {
    let url = Url::parse(invite_link).ok()?;
    Some(InlineKeyboardMarkup::new(vec![vec![InlineKeyboardButton::url(
        t(lang, "button-join"),
        url,
    )]]))
}
