use rusqlite::Connection;

use crate::error::AppResult;
use crate::storage::accounts::{bind_identity, Account, MessagingIdentity};
use crate::storage::payments::find_by_order_id;

/// Result of looking up an order token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The token belongs to a payment; the identity is now bound to its account
    Resolved(Account),
    /// No token, or no payment with that token
    Unresolved,
}

/// Resolves an optional order token for the given identity.
///
/// A blank or unknown token yields [`Resolution::Unresolved`] without
/// touching the accounts table. On a hit the identity is bound to the
/// transaction's account, and the checkout email fills the account email
/// when it has none.
pub fn resolve_order_token(
    conn: &Connection,
    identity: &MessagingIdentity,
    token: Option<&str>,
) -> AppResult<Resolution> {
    let token = match token.map(str::trim) {
        Some(t) if !t.is_empty() => t,
        _ => return Ok(Resolution::Unresolved),
    };

    let Some(transaction) = find_by_order_id(conn, token)? else {
        log::info!("Order token {} not found for telegram user {}", token, identity.telegram_id);
        return Ok(Resolution::Unresolved);
    };

    let account = bind_identity(
        conn,
        transaction.account_id,
        identity,
        transaction.customer_email.as_deref(),
    )?;
    log::info!(
        "Order {} resolved telegram user {} to account {}",
        token,
        identity.telegram_id,
        account.account_id
    );
    Ok(Resolution::Resolved(account))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::accounts::{create_payment_account, ensure_account, get_account};
    use crate::storage::migrations::run_migrations;
    use crate::storage::payments::insert_transaction;

    fn conn() -> Connection {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        conn
    }

    fn accounts_snapshot(conn: &Connection) -> Vec<(i64, Option<i64>, Option<String>, Option<String>)> {
        let mut stmt = conn
            .prepare("SELECT account_id, telegram_id, full_name, email FROM accounts ORDER BY account_id")
            .unwrap();
        stmt.query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?, r.get(3)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn missing_and_blank_tokens_are_unresolved() {
        let conn = conn();
        let who = MessagingIdentity::new(5, "Ivan", None);
        assert_eq!(resolve_order_token(&conn, &who, None).unwrap(), Resolution::Unresolved);
        assert_eq!(resolve_order_token(&conn, &who, Some("   ")).unwrap(), Resolution::Unresolved);
    }

    #[test]
    fn unknown_token_never_mutates_accounts() {
        let conn = conn();
        let paying = create_payment_account(&conn, "p@example.com", Some("Payer")).unwrap();
        insert_transaction(&conn, "ORD1", paying, Some(1), None).unwrap();
        let who = MessagingIdentity::new(5, "Ivan", None);
        ensure_account(&conn, &who).unwrap();

        let before = accounts_snapshot(&conn);
        for token in ["ORD2", "ord1", "ORD1 x", "'; DROP TABLE accounts; --"] {
            assert_eq!(resolve_order_token(&conn, &who, Some(token)).unwrap(), Resolution::Unresolved);
        }
        assert_eq!(accounts_snapshot(&conn), before);
    }

    #[test]
    fn known_token_binds_identity_and_checkout_email() {
        let conn = conn();
        conn.execute("INSERT INTO accounts (full_name) VALUES ('Old Name')", []).unwrap();
        let paying = conn.last_insert_rowid();
        insert_transaction(&conn, "ORD123", paying, Some(1), Some("buyer@example.com")).unwrap();

        let who = MessagingIdentity::new(5, "Ivan Ivanov", Some("ivan".into()));
        let Resolution::Resolved(account) = resolve_order_token(&conn, &who, Some(" ORD123 ")).unwrap() else {
            panic!("token should resolve");
        };

        assert_eq!(account.account_id, paying);
        let stored = get_account(&conn, paying).unwrap().unwrap();
        assert_eq!(stored.telegram_id, Some(5));
        assert_eq!(stored.full_name.as_deref(), Some("Ivan Ivanov"));
        assert_eq!(stored.email.as_deref(), Some("buyer@example.com"));
    }
}
