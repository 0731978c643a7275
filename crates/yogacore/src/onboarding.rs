//! The `/start` protocol: resolve the identity, check entitlement, admit.
//!
//! [`Onboarding`] owns everything the flow needs so the bot handlers only
//! translate outcomes into messages.

use lazy_regex::regex_is_match;
use std::sync::Arc;

use crate::conversation::{ConversationEvent, ConversationStore};
use crate::entitlement::{admit, has_active_subscription, resolve_order_token, AdmissionOutcome, InviteIssuer, Resolution};
use crate::error::AppResult;
use crate::storage::accounts::{bind_identity, ensure_account, find_by_email, find_by_telegram_id, Account, MessagingIdentity};
use crate::storage::memberships::get_membership;
use crate::storage::subscriptions::{latest_for_account, Subscription};
use crate::storage::{get_connection, DbPool};

/// What happened to an account that was identified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    Admitted { invite_link: String },
    AlreadyMember,
    /// No active subscription; the user should pick a plan
    NotEntitled,
}

/// Why the bot asks for an email
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailPromptReason {
    NoToken,
    TokenNotFound,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Verified { account: Account, access: Access },
    AwaitingEmail { reason: EmailPromptReason },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailOutcome {
    Verified { account: Account, access: Access },
    /// No account has this email; the conversation is over
    NotFound,
    /// Text is not email-shaped; still waiting
    Malformed,
    /// The chat is not waiting for an email
    NotAwaiting,
}

/// Snapshot shown by `/status`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberStatus {
    pub account: Account,
    pub entitled: bool,
    pub member: bool,
    pub latest_subscription: Option<Subscription>,
}

pub struct Onboarding {
    pool: Arc<DbPool>,
    issuer: Arc<dyn InviteIssuer>,
    group_id: i64,
    conversations: ConversationStore,
}

impl Onboarding {
    pub fn new(pool: Arc<DbPool>, issuer: Arc<dyn InviteIssuer>, group_id: i64) -> Self {
        Self {
            pool,
            issuer,
            group_id,
            conversations: ConversationStore::new(),
        }
    }

    pub fn group_id(&self) -> i64 {
        self.group_id
    }

    /// Handles `/start` with an optional order token.
    ///
    /// Any previous conversation of the chat is dropped first.
    pub async fn start(&self, identity: &MessagingIdentity, token: Option<&str>) -> AppResult<StartOutcome> {
        let chat = identity.telegram_id;
        self.conversations.apply(chat, ConversationEvent::Cancel);

        let has_token = token.is_some_and(|t| !t.trim().is_empty());
        let resolution = {
            let conn = get_connection(&self.pool)?;
            let resolution = resolve_order_token(&conn, identity, token)?;
            if resolution == Resolution::Unresolved {
                ensure_account(&conn, identity)?;
            }
            resolution
        };

        match resolution {
            Resolution::Resolved(account) => {
                self.conversations.apply(chat, ConversationEvent::TokenResolved);
                let access = self.grant(&account).await?;
                Ok(StartOutcome::Verified { account, access })
            }
            Resolution::Unresolved => {
                self.conversations.apply(chat, ConversationEvent::TokenUnresolved);
                let reason = if has_token {
                    EmailPromptReason::TokenNotFound
                } else {
                    EmailPromptReason::NoToken
                };
                Ok(StartOutcome::AwaitingEmail { reason })
            }
        }
    }

    /// Handles a text message that may be the awaited email.
    ///
    /// Once an email-shaped text is accepted the conversation ends, whatever
    /// the lookup yields. A matching account takes over the sender's Telegram
    /// identity, as a resolved order token would.
    pub async fn submit_email(&self, identity: &MessagingIdentity, text: &str) -> AppResult<EmailOutcome> {
        let chat = identity.telegram_id;
        if !self.conversations.is_awaiting_email(chat) {
            return Ok(EmailOutcome::NotAwaiting);
        }

        let email = text.trim();
        if !is_email_shaped(email) {
            self.conversations.apply(chat, ConversationEvent::InvalidEmail);
            return Ok(EmailOutcome::Malformed);
        }
        self.conversations.apply(chat, ConversationEvent::EmailSubmitted);

        let account = {
            let conn = get_connection(&self.pool)?;
            match find_by_email(&conn, email)? {
                Some(found) => Some(bind_identity(&conn, found.account_id, identity, None)?),
                None => None,
            }
        };
        let Some(account) = account else {
            log::info!("No account with the email submitted by telegram user {}", chat);
            return Ok(EmailOutcome::NotFound);
        };
        log::info!("Telegram user {} bound to account {} by email", chat, account.account_id);

        let access = self.grant(&account).await?;
        Ok(EmailOutcome::Verified { account, access })
    }

    pub fn is_awaiting_email(&self, chat_id: i64) -> bool {
        self.conversations.is_awaiting_email(chat_id)
    }

    /// Leaves the email fallback. Returns true if the chat was waiting for one.
    pub fn cancel(&self, chat_id: i64) -> bool {
        let was_waiting = self.conversations.is_awaiting_email(chat_id);
        self.conversations.apply(chat_id, ConversationEvent::Cancel);
        was_waiting
    }

    /// Makes sure the sender has an account, as on first contact.
    pub fn register(&self, identity: &MessagingIdentity) -> AppResult<Account> {
        let conn = get_connection(&self.pool)?;
        ensure_account(&conn, identity)
    }

    /// Entitlement and membership of the account bound to a Telegram id.
    pub fn status(&self, telegram_id: i64) -> AppResult<Option<MemberStatus>> {
        let conn = get_connection(&self.pool)?;
        let Some(account) = find_by_telegram_id(&conn, telegram_id)? else {
            return Ok(None);
        };
        let entitled = has_active_subscription(&conn, account.account_id)?;
        let member = get_membership(&conn, self.group_id, account.account_id)?.is_some_and(|m| m.is_active);
        let latest_subscription = latest_for_account(&conn, account.account_id)?;
        Ok(Some(MemberStatus {
            account,
            entitled,
            member,
            latest_subscription,
        }))
    }

    async fn grant(&self, account: &Account) -> AppResult<Access> {
        let entitled = {
            let conn = get_connection(&self.pool)?;
            has_active_subscription(&conn, account.account_id)?
        };
        if !entitled {
            return Ok(Access::NotEntitled);
        }

        match admit(&self.pool, self.issuer.as_ref(), account.account_id, self.group_id).await? {
            AdmissionOutcome::Admitted { invite_link } => Ok(Access::Admitted { invite_link }),
            AdmissionOutcome::AlreadyMember => Ok(Access::AlreadyMember),
        }
    }
}

/// Loose shape check: something@domain.tld without spaces.
pub fn is_email_shaped(text: &str) -> bool {
    regex_is_match!(r"^[^\s@]+@[^\s@]+\.[^\s@]+$", text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(is_email_shaped("user@example.com"));
        assert!(is_email_shaped("a.b+c@mail.example.ru"));
        assert!(!is_email_shaped("user@example"));
        assert!(!is_email_shaped("user example.com"));
        assert!(!is_email_shaped("hello"));
        assert!(!is_email_shaped("a@b@c.com"));
    }
}
