//! Telegram bot integration and handlers

pub mod bot;
pub mod callback_data;
pub mod handlers;
pub mod invite;
pub mod keyboards;
pub mod notifications;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use invite::TelegramInviteIssuer;

pub type Bot = teloxide::Bot;
