use rusqlite::{params, Connection, OptionalExtension, Row};
use strum::{AsRefStr, Display, EnumString};

/// Subscription status values written by this crate.
///
/// Rows may carry other values written by hand; anything other than
/// `active` does not grant access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
}

/// Subscription row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub subscription_id: i64,
    pub account_id: i64,
    pub plan_id: i64,
    pub status: String,
    pub created_at: String,
    pub expire_at: Option<String>,
}

impl Subscription {
    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active.as_ref()
    }
}

fn subscription_from_row(row: &Row<'_>) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        subscription_id: row.get(0)?,
        account_id: row.get(1)?,
        plan_id: row.get(2)?,
        status: row.get(3)?,
        created_at: row.get(4)?,
        expire_at: row.get(5)?,
    })
}

/// True when the account has a subscription with status `active` on an existing plan.
pub fn has_active_subscription(conn: &Connection, account_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS (
            SELECT 1 FROM subscriptions s
            JOIN subscription_plans p ON p.plan_id = s.plan_id
            WHERE s.account_id = ?1 AND s.status = ?2
        )",
        params![account_id, SubscriptionStatus::Active.as_ref()],
        |row| row.get(0),
    )
}

pub fn get_subscription(conn: &Connection, subscription_id: i64) -> rusqlite::Result<Option<Subscription>> {
    conn.query_row(
        "SELECT subscription_id, account_id, plan_id, status, created_at, expire_at
         FROM subscriptions WHERE subscription_id = ?1",
        [subscription_id],
        subscription_from_row,
    )
    .optional()
}

/// Most recently created subscription of an account, whatever its status.
pub fn latest_for_account(conn: &Connection, account_id: i64) -> rusqlite::Result<Option<Subscription>> {
    conn.query_row(
        "SELECT subscription_id, account_id, plan_id, status, created_at, expire_at
         FROM subscriptions WHERE account_id = ?1
         ORDER BY created_at DESC, subscription_id DESC LIMIT 1",
        [account_id],
        subscription_from_row,
    )
    .optional()
}

pub fn insert_subscription(
    conn: &Connection,
    account_id: i64,
    plan_id: i64,
    status: SubscriptionStatus,
    created_at: &str,
    expire_at: Option<&str>,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO subscriptions (account_id, plan_id, status, created_at, expire_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        params![account_id, plan_id, status.as_ref(), created_at, expire_at],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Marks active subscriptions whose `expire_at` is before `now` as expired.
///
/// Returns the number of subscriptions changed.
pub fn expire_overdue(conn: &Connection, now: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE subscriptions SET status = ?1
         WHERE status = ?2 AND expire_at IS NOT NULL AND expire_at <= ?3",
        params![
            SubscriptionStatus::Expired.as_ref(),
            SubscriptionStatus::Active.as_ref(),
            now
        ],
    )
}
