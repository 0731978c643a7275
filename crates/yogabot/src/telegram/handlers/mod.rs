//! Telegram bot handler tree configuration
//!
//! The same schema runs in polling and webhook mode.

mod callbacks;
mod commands;
mod conversation;
mod group;
mod replies;
mod schema;
mod types;

pub use schema::schema;
pub use types::{identity_from_user, user_lang, HandlerDeps, HandlerError};
