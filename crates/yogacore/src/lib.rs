//! Yogacore - storage, entitlement and payment logic for the yoga club bot
//!
//! Nothing in this crate talks to Telegram directly. The bot crate plugs the
//! Bot API in through [`entitlement::InviteIssuer`].
//!
//! # Module Structure
//!
//! - `config`: Environment configuration
//! - `error`: Application error types
//! - `logging`: Logger bootstrap and startup diagnostics
//! - `storage`: Connection pool, migrations and per-table repositories
//! - `entitlement`: Identity resolution, entitlement check, group admission
//! - `conversation`: Per-chat email fallback state machine
//! - `onboarding`: The `/start` → admission protocol built from the above
//! - `payments`: Payment links, completion callbacks, signatures
//! - `expiry`: Hourly sweep of overdue subscriptions

pub mod config;
pub mod conversation;
pub mod entitlement;
pub mod error;
pub mod expiry;
pub mod logging;
pub mod onboarding;
pub mod payments;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::Config;
pub use error::{AppError, AppResult};
pub use logging::{init_logger, log_configuration_summary};
pub use storage::{create_pool, get_connection, DbConnection, DbPool};
