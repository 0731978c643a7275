//! Payment completion callback
//!
//! The processor reports a finished checkout; a successful, correctly priced
//! payment for a known order turns into an active subscription. Repeated
//! deliveries of the same order return the subscription created the first
//! time.

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::AppError;
use crate::payments::duration::parse_plan_duration;
use crate::storage::format_timestamp;
use crate::storage::payments::{attach_subscription, find_by_order_id};
use crate::storage::plans::get_plan;
use crate::storage::subscriptions::{get_subscription, insert_subscription, SubscriptionStatus};

const SUCCESS_STATUS: &str = "success";

/// Callback body sent by the payment processor
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaymentCallback {
    pub order_id: String,
    pub payment_status: String,
    pub transaction_sum: i64,
    pub plan_id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentReceipt {
    pub subscription_id: i64,
    pub account_id: i64,
    pub expire_at: Option<String>,
    /// True when the order had been processed by an earlier delivery
    pub already_processed: bool,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Invalid payment status {0:?}")]
    InvalidStatus(String),

    #[error("Plan {0} not found")]
    PlanNotFound(i64),

    #[error("Transaction sum {actual} does not match the plan price {expected}")]
    SumMismatch { expected: i64, actual: i64 },

    #[error("Order was placed for plan {ordered}, callback reports plan {paid}")]
    PlanMismatch { ordered: i64, paid: i64 },

    #[error("Order {0} not found")]
    OrderNotFound(String),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error(transparent)]
    Storage(#[from] AppError),
}

impl From<rusqlite::Error> for PaymentError {
    fn from(err: rusqlite::Error) -> Self {
        PaymentError::Storage(AppError::Database(err))
    }
}

impl PaymentError {
    /// HTTP status the callback endpoint answers with.
    pub fn http_status(&self) -> u16 {
        match self {
            PaymentError::InvalidStatus(_)
            | PaymentError::PlanNotFound(_)
            | PaymentError::SumMismatch { .. }
            | PaymentError::PlanMismatch { .. }
            | PaymentError::MalformedPayload(_)
            | PaymentError::Storage(AppError::Validation(_)) => 400,
            PaymentError::InvalidSignature => 401,
            PaymentError::OrderNotFound(_) => 404,
            PaymentError::Storage(_) => 500,
        }
    }
}

/// Applies a payment completion callback.
///
/// Subscription insert and transaction update commit together.
pub fn process_payment_callback(
    conn: &Connection,
    callback: &PaymentCallback,
    now: DateTime<Utc>,
) -> Result<PaymentReceipt, PaymentError> {
    if callback.payment_status != SUCCESS_STATUS {
        return Err(PaymentError::InvalidStatus(callback.payment_status.clone()));
    }

    let plan = get_plan(conn, callback.plan_id)?.ok_or(PaymentError::PlanNotFound(callback.plan_id))?;
    if callback.transaction_sum != plan.price {
        log::warn!(
            "Order {}: sum {} does not match price {} of plan {}",
            callback.order_id,
            callback.transaction_sum,
            plan.price,
            plan.plan_id
        );
        return Err(PaymentError::SumMismatch {
            expected: plan.price,
            actual: callback.transaction_sum,
        });
    }
    let duration = parse_plan_duration(&plan.duration)?;
    let expires = now.checked_add_signed(duration).ok_or_else(|| {
        AppError::Validation(format!("plan {} duration {:?} is out of range", plan.plan_id, plan.duration))
    })?;

    let tx = conn.unchecked_transaction()?;
    let order = find_by_order_id(&tx, &callback.order_id)?
        .ok_or_else(|| PaymentError::OrderNotFound(callback.order_id.clone()))?;
    if let Some(ordered) = order.plan_id.filter(|&ordered| ordered != plan.plan_id) {
        log::warn!("Order {}: placed for plan {}, paid for plan {}", order.order_id, ordered, plan.plan_id);
        return Err(PaymentError::PlanMismatch {
            ordered,
            paid: plan.plan_id,
        });
    }

    if let Some(subscription_id) = order.subscription_id {
        log::info!("Order {} already processed (subscription {})", order.order_id, subscription_id);
        let expire_at = get_subscription(&tx, subscription_id)?.and_then(|s| s.expire_at);
        return Ok(PaymentReceipt {
            subscription_id,
            account_id: order.account_id,
            expire_at,
            already_processed: true,
        });
    }

    let created_at = format_timestamp(now);
    let expire_at = format_timestamp(expires);
    let subscription_id = insert_subscription(
        &tx,
        order.account_id,
        plan.plan_id,
        SubscriptionStatus::Active,
        &created_at,
        Some(&expire_at),
    )?;
    attach_subscription(&tx, &order.order_id, subscription_id, callback.transaction_sum)?;
    tx.commit()?;

    log::info!(
        "Order {} activated subscription {} for account {} until {}",
        order.order_id,
        subscription_id,
        order.account_id,
        expire_at
    );
    Ok(PaymentReceipt {
        subscription_id,
        account_id: order.account_id,
        expire_at: Some(expire_at),
        already_processed: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::accounts::create_payment_account;
    use crate::storage::migrations::run_migrations;
    use crate::storage::payments::insert_transaction;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn setup() -> (Connection, i64) {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).unwrap();
        let account = create_payment_account(&conn, "buyer@example.com", None).unwrap();
        insert_transaction(&conn, "ORD123", account, Some(1), Some("buyer@example.com")).unwrap();
        (conn, account)
    }

    fn callback(status: &str, sum: i64) -> PaymentCallback {
        PaymentCallback {
            order_id: "ORD123".into(),
            payment_status: status.into(),
            transaction_sum: sum,
            plan_id: 1,
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn subscription_count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM subscriptions", [], |r| r.get(0)).unwrap()
    }

    #[test]
    fn success_creates_active_subscription() {
        let (conn, account) = setup();
        let receipt = process_payment_callback(&conn, &callback("success", 3000), now()).unwrap();

        assert_eq!(receipt.account_id, account);
        assert_eq!(receipt.expire_at.as_deref(), Some("2024-03-31 12:00:00"));
        assert!(!receipt.already_processed);

        let sub = get_subscription(&conn, receipt.subscription_id).unwrap().unwrap();
        assert!(sub.is_active());
        assert_eq!(sub.created_at, "2024-03-01 12:00:00");
        let order = find_by_order_id(&conn, "ORD123").unwrap().unwrap();
        assert_eq!(order.subscription_id, Some(receipt.subscription_id));
        assert_eq!(order.transaction_sum, Some(3000));
    }

    #[test]
    fn redelivery_is_idempotent() {
        let (conn, _) = setup();
        let first = process_payment_callback(&conn, &callback("success", 3000), now()).unwrap();
        let later = now() + chrono::TimeDelta::hours(5);
        let second = process_payment_callback(&conn, &callback("success", 3000), later).unwrap();

        assert_eq!(second.subscription_id, first.subscription_id);
        assert_eq!(second.expire_at, first.expire_at);
        assert!(second.already_processed);
        assert_eq!(subscription_count(&conn), 1);
    }

    #[test]
    fn rejected_callbacks_change_nothing() {
        let (conn, _) = setup();

        let err = process_payment_callback(&conn, &callback("failed", 3000), now()).unwrap_err();
        assert_eq!(err.http_status(), 400);

        let err = process_payment_callback(&conn, &callback("success", 2999), now()).unwrap_err();
        assert!(matches!(err, PaymentError::SumMismatch { expected: 3000, actual: 2999 }));

        let mut unknown_plan = callback("success", 3000);
        unknown_plan.plan_id = 42;
        let err = process_payment_callback(&conn, &unknown_plan, now()).unwrap_err();
        assert_eq!(err.http_status(), 400);

        let mut unknown_order = callback("success", 3000);
        unknown_order.order_id = "ORD999".into();
        let err = process_payment_callback(&conn, &unknown_order, now()).unwrap_err();
        assert_eq!(err.http_status(), 404);

        assert_eq!(subscription_count(&conn), 0);
    }

    #[test]
    fn unparsable_plan_duration_is_a_client_error() {
        let (conn, _) = setup();
        conn.execute("UPDATE subscription_plans SET duration = 'forever' WHERE plan_id = 1", [])
            .unwrap();
        let err = process_payment_callback(&conn, &callback("success", 3000), now()).unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert_eq!(subscription_count(&conn), 0);
    }

    #[test]
    fn duration_past_the_calendar_end_is_a_client_error() {
        let (conn, _) = setup();
        conn.execute(
            "UPDATE subscription_plans SET duration = '100000000 дней' WHERE plan_id = 1",
            [],
        )
        .unwrap();

        let err = process_payment_callback(&conn, &callback("success", 3000), now()).unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert_eq!(subscription_count(&conn), 0);
        let order = find_by_order_id(&conn, "ORD123").unwrap().unwrap();
        assert_eq!(order.subscription_id, None);
    }

    #[test]
    fn callback_for_another_plan_than_ordered_is_rejected() {
        let (conn, _) = setup();
        let other = get_plan(&conn, 2).unwrap().unwrap();
        let cb = PaymentCallback {
            plan_id: other.plan_id,
            ..callback("success", other.price)
        };

        let err = process_payment_callback(&conn, &cb, now()).unwrap_err();
        assert!(matches!(err, PaymentError::PlanMismatch { ordered: 1, paid: 2 }));
        assert_eq!(err.http_status(), 400);
        assert_eq!(subscription_count(&conn), 0);
    }
}
