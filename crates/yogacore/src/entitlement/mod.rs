//! Account linking and entitlement protocol
//!
//! - [`resolver`]: binds a messaging identity to the account behind an order token
//! - [`checker`]: answers "does this account hold an active subscription?"
//! - [`admission`]: grants group access through a single-use invite link

pub mod admission;
pub mod checker;
pub mod resolver;

use async_trait::async_trait;

use crate::error::AppResult;

pub use admission::{admit, AdmissionOutcome};
pub use checker::has_active_subscription;
pub use resolver::{resolve_order_token, Resolution};

/// Messaging-platform capability used by admission.
///
/// The bot implements it with the Bot API; tests use a counting fake.
#[async_trait]
pub trait InviteIssuer: Send + Sync {
    /// Creates an invite link to `group_id` that can be used exactly once.
    async fn create_single_use_invite(&self, group_id: i64, account_id: i64) -> AppResult<String>;
}
