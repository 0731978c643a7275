//! Payment transactions written by the external payment collaborator.
//!
//! The bot only reads them, except for attaching the subscription a
//! completed payment produced.

use rusqlite::{params, Connection, OptionalExtension, Row};

/// Payment transaction row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentTransaction {
    /// Order identifier issued by the processor; doubles as the `/start` token
    pub order_id: String,
    /// Account that paid
    pub account_id: i64,
    pub plan_id: Option<i64>,
    /// Email the customer entered at checkout
    pub customer_email: Option<String>,
    pub transaction_sum: Option<i64>,
    /// Set once the completion callback created a subscription
    pub subscription_id: Option<i64>,
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<PaymentTransaction> {
    Ok(PaymentTransaction {
        order_id: row.get(0)?,
        account_id: row.get(1)?,
        plan_id: row.get(2)?,
        customer_email: row.get(3)?,
        transaction_sum: row.get(4)?,
        subscription_id: row.get(5)?,
    })
}

/// Looks up a transaction by its order identifier.
pub fn find_by_order_id(conn: &Connection, order_id: &str) -> rusqlite::Result<Option<PaymentTransaction>> {
    conn.query_row(
        "SELECT order_id, account_id, plan_id, customer_email, transaction_sum, subscription_id
         FROM payment_transactions WHERE order_id = ?1",
        [order_id],
        transaction_from_row,
    )
    .optional()
}

/// Records a pending order, as the payment collaborator does at checkout.
pub fn insert_transaction(
    conn: &Connection,
    order_id: &str,
    account_id: i64,
    plan_id: Option<i64>,
    customer_email: Option<&str>,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO payment_transactions (order_id, account_id, plan_id, customer_email) VALUES (?1, ?2, ?3, ?4)",
        params![order_id, account_id, plan_id, customer_email],
    )?;
    Ok(())
}

/// Links a completed payment to the subscription it produced.
pub fn attach_subscription(
    conn: &Connection,
    order_id: &str,
    subscription_id: i64,
    transaction_sum: i64,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE payment_transactions SET subscription_id = ?2, transaction_sum = ?3 WHERE order_id = ?1",
        params![order_id, subscription_id, transaction_sum],
    )
}
