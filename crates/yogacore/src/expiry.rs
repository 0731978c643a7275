//! Background sweep that expires overdue subscriptions.
//!
//! Status is the only entitlement signal, so an `active` row whose
//! `expire_at` has passed must be flipped for the checker to notice.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time::interval;

use crate::config;
use crate::error::AppResult;
use crate::storage::subscriptions::expire_overdue;
use crate::storage::{get_connection, now_timestamp, DbPool};

/// Runs one sweep and returns the number of subscriptions expired.
pub fn expire_subscriptions(pool: &DbPool) -> AppResult<usize> {
    let conn = get_connection(pool)?;
    let expired = expire_overdue(&conn, &now_timestamp())?;
    if expired > 0 {
        log::info!("Expired {} subscription(s)", expired);
    }
    Ok(expired)
}

/// Spawns the hourly sweep. The first sweep runs immediately.
pub fn start_expiry_sweeper(pool: Arc<DbPool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(config::expiry::sweep_interval());
        log::info!(
            "Subscription expiry sweeper started (interval: {}s)",
            config::expiry::SWEEP_INTERVAL_SECS
        );

        loop {
            ticker.tick().await;
            if let Err(e) = expire_subscriptions(&pool) {
                log::error!("Subscription expiry sweep failed: {}", e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::accounts::create_payment_account;
    use crate::storage::create_pool;
    use crate::storage::subscriptions::{has_active_subscription, insert_subscription, SubscriptionStatus};
    use tempfile::TempDir;

    #[test]
    fn sweep_revokes_entitlement() {
        let dir = TempDir::new().unwrap();
        let pool = create_pool(dir.path().join("db.sqlite").to_str().unwrap(), 1).unwrap();
        let account = {
            let conn = get_connection(&pool).unwrap();
            let account = create_payment_account(&conn, "late@example.com", None).unwrap();
            insert_subscription(
                &conn,
                account,
                1,
                SubscriptionStatus::Active,
                "2020-01-01 00:00:00",
                Some("2020-01-31 00:00:00"),
            )
            .unwrap();
            account
        };

        assert_eq!(expire_subscriptions(&pool).unwrap(), 1);
        assert_eq!(expire_subscriptions(&pool).unwrap(), 0);
        let conn = get_connection(&pool).unwrap();
        assert!(!has_active_subscription(&conn, account).unwrap());
    }
}
