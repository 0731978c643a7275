use rusqlite::Connection;

use crate::error::AppResult;
use crate::storage::subscriptions;

/// True when the account holds a subscription with status `active`.
///
/// Re-queried on every call.
pub fn has_active_subscription(conn: &Connection, account_id: i64) -> AppResult<bool> {
    let entitled = subscriptions::has_active_subscription(conn, account_id)?;
    log::debug!("Account {} entitled: {}", account_id, entitled);
    Ok(entitled)
}
