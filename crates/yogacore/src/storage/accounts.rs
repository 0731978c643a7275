//! Accounts: the people the bot knows about.
//!
//! An account is created either by the payment side (email, no Telegram id)
//! or on first contact with the bot (Telegram id, no email). Resolving an
//! order token moves the Telegram identity onto the paying account.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{AppError, AppResult};
use crate::storage::now_timestamp;

/// Account row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub account_id: i64,
    /// Messaging-platform identity, unique when set
    pub telegram_id: Option<i64>,
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
    /// Account this first-contact row was merged into, if any
    pub linked_account_id: Option<i64>,
}

/// Who is talking to the bot, as reported by the messaging platform
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessagingIdentity {
    pub telegram_id: i64,
    pub full_name: String,
    pub username: Option<String>,
}

impl MessagingIdentity {
    pub fn new(telegram_id: i64, full_name: impl Into<String>, username: Option<String>) -> Self {
        Self {
            telegram_id,
            full_name: full_name.into(),
            username,
        }
    }
}

const ACCOUNT_COLUMNS: &str = "account_id, telegram_id, full_name, username, email, linked_account_id";

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        account_id: row.get(0)?,
        telegram_id: row.get(1)?,
        full_name: row.get(2)?,
        username: row.get(3)?,
        email: row.get(4)?,
        linked_account_id: row.get(5)?,
    })
}

/// Fetches an account by primary key.
pub fn get_account(conn: &Connection, account_id: i64) -> rusqlite::Result<Option<Account>> {
    conn.query_row(
        &format!("SELECT {} FROM accounts WHERE account_id = ?1", ACCOUNT_COLUMNS),
        [account_id],
        account_from_row,
    )
    .optional()
}

/// Fetches the account currently bound to a Telegram id.
pub fn find_by_telegram_id(conn: &Connection, telegram_id: i64) -> rusqlite::Result<Option<Account>> {
    conn.query_row(
        &format!("SELECT {} FROM accounts WHERE telegram_id = ?1", ACCOUNT_COLUMNS),
        [telegram_id],
        account_from_row,
    )
    .optional()
}

/// Looks an account up by email, ignoring case and surrounding whitespace.
pub fn find_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<Account>> {
    conn.query_row(
        &format!("SELECT {} FROM accounts WHERE lower(email) = lower(?1)", ACCOUNT_COLUMNS),
        [email.trim()],
        account_from_row,
    )
    .optional()
}

/// Registers a first contact.
///
/// Inserts an account for the Telegram id unless one is already bound to it;
/// the existing row is left untouched. Returns the bound account.
pub fn ensure_account(conn: &Connection, identity: &MessagingIdentity) -> AppResult<Account> {
    let inserted = conn.execute(
        "INSERT INTO accounts (telegram_id, full_name, username) VALUES (?1, ?2, ?3)
         ON CONFLICT (telegram_id) DO NOTHING",
        params![identity.telegram_id, identity.full_name, identity.username],
    )?;
    if inserted > 0 {
        log::info!("Registered new account for telegram user {}", identity.telegram_id);
    }

    find_by_telegram_id(conn, identity.telegram_id)?
        .ok_or_else(|| AppError::NotFound(format!("account for telegram user {}", identity.telegram_id)))
}

/// Creates an account on behalf of the payment side (email known, no Telegram identity yet).
pub fn create_payment_account(conn: &Connection, email: &str, full_name: Option<&str>) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO accounts (email, full_name) VALUES (?1, ?2)",
        params![email.trim(), full_name],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Binds a Telegram identity to `account_id`.
///
/// Runs in one transaction: the Telegram id is released from any other row
/// (which then points at `account_id` through `linked_account_id`), and the
/// target row receives the Telegram id, display name and username. `email`
/// fills the account's email only when it has none and no other account
/// already uses it.
pub fn bind_identity(
    conn: &Connection,
    account_id: i64,
    identity: &MessagingIdentity,
    email: Option<&str>,
) -> AppResult<Account> {
    let tx = conn.unchecked_transaction()?;
    let now = now_timestamp();

    if get_account(&tx, account_id)?.is_none() {
        return Err(AppError::NotFound(format!("account {}", account_id)));
    }

    let released = tx.execute(
        "UPDATE accounts SET telegram_id = NULL, linked_account_id = ?2, updated_at = ?3
         WHERE telegram_id = ?1 AND account_id <> ?2",
        params![identity.telegram_id, account_id, now],
    )?;
    if released > 0 {
        log::info!(
            "Moved telegram user {} from a first-contact account onto account {}",
            identity.telegram_id,
            account_id
        );
    }

    tx.execute(
        "UPDATE accounts
         SET telegram_id = ?2, full_name = ?3, username = ?4, updated_at = ?6,
             email = COALESCE(
                 email,
                 CASE WHEN EXISTS (
                     SELECT 1 FROM accounts other
                     WHERE lower(other.email) = lower(?5) AND other.account_id <> ?1
                 ) THEN NULL ELSE ?5 END
             )
         WHERE account_id = ?1",
        params![
            account_id,
            identity.telegram_id,
            identity.full_name,
            identity.username,
            email.map(str::trim),
            now
        ],
    )?;

    let account = tx.query_row(
        &format!("SELECT {} FROM accounts WHERE account_id = ?1", ACCOUNT_COLUMNS),
        [account_id],
        account_from_row,
    )?;
    tx.commit()?;
    Ok(account)
}
