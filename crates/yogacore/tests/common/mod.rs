//! Shared fixtures for the onboarding integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use rusqlite::params;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use yogacore::entitlement::InviteIssuer;
use yogacore::onboarding::Onboarding;
use yogacore::storage::accounts::MessagingIdentity;
use yogacore::storage::subscriptions::{insert_subscription, SubscriptionStatus};
use yogacore::{create_pool, get_connection, AppError, AppResult, DbPool};

pub const GROUP_ID: i64 = -1001234567890;

/// Invite issuer that records every request instead of calling Telegram
#[derive(Default)]
pub struct FakeIssuer {
    calls: AtomicUsize,
    issued: Mutex<Vec<(i64, i64)>>,
    fail: bool,
}

impl FakeIssuer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InviteIssuer for FakeIssuer {
    async fn create_single_use_invite(&self, group_id: i64, account_id: i64) -> AppResult<String> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(AppError::Invite("Bad Request: not enough rights".into()));
        }
        if let Ok(mut issued) = self.issued.lock() {
            issued.push((group_id, account_id));
        }
        Ok(format!("https://t.me/+fake{}", n))
    }
}

/// Fresh database file, fake issuer and onboarding flow
pub struct TestEnvironment {
    _dir: TempDir,
    pub pool: Arc<DbPool>,
    pub issuer: Arc<FakeIssuer>,
    pub onboarding: Onboarding,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self::with_issuer(FakeIssuer::default())
    }

    pub fn with_issuer(issuer: FakeIssuer) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("yoga.sqlite");
        let pool = Arc::new(create_pool(path.to_str().unwrap(), 4).unwrap());
        let issuer = Arc::new(issuer);
        let onboarding = Onboarding::new(Arc::clone(&pool), issuer.clone(), GROUP_ID);
        Self {
            _dir: dir,
            pool,
            issuer,
            onboarding,
        }
    }

    /// Account created by the payment side with a fixed id.
    pub fn create_account(&self, account_id: i64, email: Option<&str>, full_name: &str) {
        get_connection(&self.pool)
            .unwrap()
            .execute(
                "INSERT INTO accounts (account_id, email, full_name) VALUES (?1, ?2, ?3)",
                params![account_id, email, full_name],
            )
            .unwrap();
    }

    pub fn create_order(&self, order_id: &str, account_id: i64) {
        get_connection(&self.pool)
            .unwrap()
            .execute(
                "INSERT INTO payment_transactions (order_id, account_id, plan_id) VALUES (?1, ?2, 1)",
                params![order_id, account_id],
            )
            .unwrap();
    }

    pub fn subscribe(&self, account_id: i64, status: SubscriptionStatus) {
        let conn = get_connection(&self.pool).unwrap();
        insert_subscription(&conn, account_id, 1, status, "2024-01-01 00:00:00", Some("2099-01-01 00:00:00")).unwrap();
    }

    pub fn count(&self, table: &str) -> i64 {
        get_connection(&self.pool)
            .unwrap()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
            .unwrap()
    }
}

pub fn user(telegram_id: i64, name: &str) -> MessagingIdentity {
    MessagingIdentity::new(telegram_id, name, Some(name.to_lowercase()))
}
