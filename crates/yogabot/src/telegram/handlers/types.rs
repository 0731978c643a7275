//! Handler types and dependencies

use std::sync::Arc;

use teloxide::types::User;
use unic_langid::LanguageIdentifier;

use crate::i18n;
use yogacore::onboarding::Onboarding;
use yogacore::payments::PaymentLinks;
use yogacore::storage::accounts::MessagingIdentity;
use yogacore::DbPool;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub db_pool: Arc<DbPool>,
    pub onboarding: Arc<Onboarding>,
    pub payment_links: Arc<PaymentLinks>,
    /// Community group chat id
    pub group_id: i64,
    pub admin_ids: Arc<Vec<i64>>,
}

impl HandlerDeps {
    pub fn new(
        db_pool: Arc<DbPool>,
        onboarding: Arc<Onboarding>,
        payment_links: PaymentLinks,
        group_id: i64,
        admin_ids: Vec<i64>,
    ) -> Self {
        Self {
            db_pool,
            onboarding,
            payment_links: Arc::new(payment_links),
            group_id,
            admin_ids: Arc::new(admin_ids),
        }
    }
}

/// Messaging identity of a Telegram user.
pub fn identity_from_user(user: &User) -> MessagingIdentity {
    MessagingIdentity::new(telegram_id(user), user.full_name(), user.username.clone())
}

/// Telegram user ids fit in 52 bits, so the conversion never wraps in practice.
pub fn telegram_id(user: &User) -> i64 {
    i64::try_from(user.id.0).unwrap_or(i64::MAX)
}

/// Reply language for a user.
pub fn user_lang(user: Option<&User>) -> LanguageIdentifier {
    i18n::lang_from_code(user.and_then(|u| u.language_code.as_deref()))
}
