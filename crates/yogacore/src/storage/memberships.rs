//! Group membership rows: at most one per (group, account).

use rusqlite::{params, Connection, OptionalExtension, Row};
use strum::{AsRefStr, Display, EnumString};

use crate::storage::now_timestamp;

/// Last recorded membership event
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum MembershipAction {
    /// Invite link issued by admission
    Invited,
    Joined,
    Left,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupMembership {
    pub membership_id: i64,
    pub group_id: i64,
    pub account_id: i64,
    pub is_active: bool,
    pub joined_at: String,
    pub action_type: String,
    pub action_at: String,
    pub invite_link: Option<String>,
}

fn membership_from_row(row: &Row<'_>) -> rusqlite::Result<GroupMembership> {
    Ok(GroupMembership {
        membership_id: row.get(0)?,
        group_id: row.get(1)?,
        account_id: row.get(2)?,
        is_active: row.get(3)?,
        joined_at: row.get(4)?,
        action_type: row.get(5)?,
        action_at: row.get(6)?,
        invite_link: row.get(7)?,
    })
}

pub fn get_membership(conn: &Connection, group_id: i64, account_id: i64) -> rusqlite::Result<Option<GroupMembership>> {
    conn.query_row(
        "SELECT membership_id, group_id, account_id, is_active, joined_at, action_type, action_at, invite_link
         FROM group_memberships WHERE group_id = ?1 AND account_id = ?2",
        params![group_id, account_id],
        membership_from_row,
    )
    .optional()
}

/// Inserts the admission row. Fails with a UNIQUE violation when one already exists.
pub fn insert_membership(conn: &Connection, group_id: i64, account_id: i64) -> rusqlite::Result<i64> {
    let now = now_timestamp();
    conn.execute(
        "INSERT INTO group_memberships (group_id, account_id, is_active, joined_at, action_type, action_at)
         VALUES (?1, ?2, 1, ?3, ?4, ?3)",
        params![group_id, account_id, now, MembershipAction::Invited.as_ref()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn set_invite_link(conn: &Connection, membership_id: i64, invite_link: &str) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE group_memberships SET invite_link = ?2 WHERE membership_id = ?1",
        params![membership_id, invite_link],
    )?;
    Ok(())
}

/// Removes a membership row whose invite could not be issued.
pub fn delete_membership(conn: &Connection, membership_id: i64) -> rusqlite::Result<()> {
    conn.execute("DELETE FROM group_memberships WHERE membership_id = ?1", [membership_id])?;
    Ok(())
}

/// Records a join or leave seen in the group for an account that already has a row.
///
/// Returns false when the account was never admitted; no row is created then.
pub fn record_group_event(
    conn: &Connection,
    group_id: i64,
    account_id: i64,
    action: MembershipAction,
) -> rusqlite::Result<bool> {
    let is_active = action != MembershipAction::Left;
    let updated = conn.execute(
        "UPDATE group_memberships SET is_active = ?3, action_type = ?4, action_at = ?5
         WHERE group_id = ?1 AND account_id = ?2",
        params![group_id, account_id, is_active, action.as_ref(), now_timestamp()],
    )?;
    Ok(updated > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::is_unique_violation;
    use crate::storage::accounts::create_payment_account;
    use crate::storage::migrations::run_migrations;

    fn setup() -> (Connection, i64) {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        let account = create_payment_account(&conn, "m@example.com", None).unwrap();
        (conn, account)
    }

    #[test]
    fn second_insert_is_a_unique_violation() {
        let (conn, account) = setup();
        insert_membership(&conn, -100, account).unwrap();

        let err = insert_membership(&conn, -100, account).unwrap_err();
        assert!(is_unique_violation(&err));
        // Another group is a separate row
        insert_membership(&conn, -200, account).unwrap();
    }

    #[test]
    fn invite_link_and_events_update_the_row() {
        let (conn, account) = setup();
        let id = insert_membership(&conn, -100, account).unwrap();
        set_invite_link(&conn, id, "https://t.me/+abc").unwrap();

        assert!(record_group_event(&conn, -100, account, MembershipAction::Left).unwrap());
        let row = get_membership(&conn, -100, account).unwrap().unwrap();
        assert!(!row.is_active);
        assert_eq!(row.action_type, "left");
        assert_eq!(row.invite_link.as_deref(), Some("https://t.me/+abc"));

        assert!(record_group_event(&conn, -100, account, MembershipAction::Joined).unwrap());
        assert!(get_membership(&conn, -100, account).unwrap().unwrap().is_active);
    }

    #[test]
    fn events_for_unknown_members_are_ignored() {
        let (conn, account) = setup();
        assert!(!record_group_event(&conn, -100, account, MembershipAction::Joined).unwrap());
        assert!(get_membership(&conn, -100, account).unwrap().is_none());
    }

    #[test]
    fn delete_frees_the_slot() {
        let (conn, account) = setup();
        let id = insert_membership(&conn, -100, account).unwrap();
        delete_membership(&conn, id).unwrap();
        insert_membership(&conn, -100, account).unwrap();
    }
}
