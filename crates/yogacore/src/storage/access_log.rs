use rusqlite::{params, Connection};
use strum::{AsRefStr, Display, EnumString};

use crate::storage::now_timestamp;

/// What a user did in the community group
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum AccessAction {
    Joined,
    Left,
    Message,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLogEntry {
    pub telegram_user_id: i64,
    pub group_id: i64,
    pub action: String,
    pub message_text: Option<String>,
    pub created_at: String,
}

/// Appends one event to the group journal.
pub fn append(
    conn: &Connection,
    telegram_user_id: i64,
    group_id: i64,
    action: AccessAction,
    message_text: Option<&str>,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO access_logs (telegram_user_id, group_id, action, message_text, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![telegram_user_id, group_id, action.as_ref(), message_text, now_timestamp()],
    )?;
    Ok(())
}

/// Journal entries of one user, oldest first.
pub fn list_for_user(conn: &Connection, telegram_user_id: i64) -> rusqlite::Result<Vec<AccessLogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT telegram_user_id, group_id, action, message_text, created_at
         FROM access_logs WHERE telegram_user_id = ?1 ORDER BY access_id ASC",
    )?;
    let rows = stmt.query_map([telegram_user_id], |row| {
        Ok(AccessLogEntry {
            telegram_user_id: row.get(0)?,
            group_id: row.get(1)?,
            action: row.get(2)?,
            message_text: row.get(3)?,
            created_at: row.get(4)?,
        })
    })?;
    rows.collect()
}
