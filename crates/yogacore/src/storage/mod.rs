//! Database pool, migrations and per-table repositories

pub mod access_log;
pub mod accounts;
pub mod db;
pub mod memberships;
pub mod migrations;
pub mod payments;
pub mod plans;
pub mod subscriptions;

// Re-exports for convenience
pub use db::{create_pool, get_connection, DbConnection, DbPool};

/// Format of every timestamp column (UTC). Lexicographic order equals time order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats a UTC instant the way timestamp columns store it.
pub fn format_timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// Current UTC time formatted for a timestamp column.
pub fn now_timestamp() -> String {
    format_timestamp(chrono::Utc::now())
}
