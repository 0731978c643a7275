//! Per-chat email fallback conversation
//!
//! ```text
//!  Init ──start (token resolved)──────────────▶ Done
//!   │
//!   └──start (no token / unknown token)──▶ AwaitEmail ──email──▶ Done
//!                                              │  ▲
//!                                              └──┘ not an email
//! ```
//!
//! `/cancel` and a new `/start` reset a chat to `Init` from any state.

use dashmap::DashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConversationState {
    #[default]
    Init,
    AwaitEmail,
    Done,
}

/// Inputs that move a conversation forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversationEvent {
    /// `/start` resolved an order token
    TokenResolved,
    /// `/start` without a usable token
    TokenUnresolved,
    /// A text message shaped like an email was processed
    EmailSubmitted,
    /// A text message that is not an email arrived while awaiting one
    InvalidEmail,
    Cancel,
}

impl ConversationState {
    /// Applies an event. Events that do not apply to the current state leave it unchanged.
    pub fn on(self, event: ConversationEvent) -> Self {
        use ConversationEvent::*;
        use ConversationState::*;

        match (self, event) {
            (_, Cancel) => Init,
            (_, TokenResolved) => Done,
            (_, TokenUnresolved) => AwaitEmail,
            (AwaitEmail, EmailSubmitted) => Done,
            (AwaitEmail, InvalidEmail) => AwaitEmail,
            (state, _) => state,
        }
    }

    pub fn is_terminal(self) -> bool {
        self == ConversationState::Done
    }
}

/// Conversation state per chat, kept in memory.
///
/// Chats in `Init` or `Done` are not stored, so the map only holds chats
/// that are waiting for an email.
#[derive(Debug, Default)]
pub struct ConversationStore {
    states: DashMap<i64, ConversationState>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, chat_id: i64) -> ConversationState {
        self.states.get(&chat_id).map(|s| *s).unwrap_or_default()
    }

    /// Applies `event` to the chat's conversation and returns the new state.
    pub fn apply(&self, chat_id: i64, event: ConversationEvent) -> ConversationState {
        let next = self.get(chat_id).on(event);
        match next {
            ConversationState::AwaitEmail => {
                self.states.insert(chat_id, next);
            }
            ConversationState::Init | ConversationState::Done => {
                self.states.remove(&chat_id);
            }
        }
        next
    }

    pub fn is_awaiting_email(&self, chat_id: i64) -> bool {
        self.get(chat_id) == ConversationState::AwaitEmail
    }
}
