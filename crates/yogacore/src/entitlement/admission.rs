//! Group admission
//!
//! A membership row for (group, account) means an invite was issued. The row
//! is inserted before the invite is requested; losing the insert race to a
//! concurrent admission is "already a member". If the platform refuses the
//! invite the row is removed again so a later attempt can succeed.

use crate::entitlement::InviteIssuer;
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::storage::memberships::{delete_membership, get_membership, insert_membership, set_invite_link};
use crate::storage::{get_connection, DbPool};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionOutcome {
    /// A new single-use invite was issued
    Admitted { invite_link: String },
    /// A membership row already exists; no link is issued
    AlreadyMember,
}

/// Admits `account_id` into `group_id`.
///
/// The pooled connection is released before the invite request, so the
/// platform round-trip never pins a database connection.
pub async fn admit(
    pool: &DbPool,
    issuer: &dyn InviteIssuer,
    account_id: i64,
    group_id: i64,
) -> AppResult<AdmissionOutcome> {
    let membership_id = {
        let conn = get_connection(pool)?;
        if get_membership(&conn, group_id, account_id)?.is_some() {
            log::info!("Account {} already a member of {}", account_id, group_id);
            return Ok(AdmissionOutcome::AlreadyMember);
        }
        match insert_membership(&conn, group_id, account_id) {
            Ok(id) => id,
            Err(e) if is_unique_violation(&e) => {
                log::info!("Concurrent admission for account {} in {}", account_id, group_id);
                return Ok(AdmissionOutcome::AlreadyMember);
            }
            Err(e) => return Err(AppError::Database(e)),
        }
    };

    let invite_link = match issuer.create_single_use_invite(group_id, account_id).await {
        Ok(link) => link,
        Err(e) => {
            log::error!("Invite for account {} failed, rolling back membership: {}", account_id, e);
            let conn = get_connection(pool)?;
            delete_membership(&conn, membership_id)?;
            return Err(e);
        }
    };

    let conn = get_connection(pool)?;
    set_invite_link(&conn, membership_id, &invite_link)?;
    log::info!("Admitted account {} into {}", account_id, group_id);
    Ok(AdmissionOutcome::Admitted { invite_link })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::accounts::create_payment_account;
    use crate::storage::create_pool;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct CountingIssuer {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl InviteIssuer for CountingIssuer {
        async fn create_single_use_invite(&self, _group_id: i64, account_id: i64) -> AppResult<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::Invite("bot is not an admin".into()));
            }
            Ok(format!("https://t.me/+invite{}_{}", account_id, n))
        }
    }

    fn setup() -> (TempDir, DbPool, i64) {
        let dir = TempDir::new().unwrap();
        let pool = create_pool(dir.path().join("db.sqlite").to_str().unwrap(), 2).unwrap();
        let account = create_payment_account(&get_connection(&pool).unwrap(), "a@example.com", None).unwrap();
        (dir, pool, account)
    }

    #[tokio::test]
    async fn failed_invite_leaves_no_row() {
        let (_dir, pool, account) = setup();
        let issuer = CountingIssuer {
            calls: AtomicUsize::new(0),
            fail: true,
        };

        assert!(matches!(admit(&pool, &issuer, account, -100).await, Err(AppError::Invite(_))));
        let conn = get_connection(&pool).unwrap();
        assert!(get_membership(&conn, -100, account).unwrap().is_none());
    }

    #[tokio::test]
    async fn issued_link_is_stored() {
        let (_dir, pool, account) = setup();
        let issuer = CountingIssuer {
            calls: AtomicUsize::new(0),
            fail: false,
        };

        let AdmissionOutcome::Admitted { invite_link } = admit(&pool, &issuer, account, -100).await.unwrap() else {
            panic!("expected admission");
        };
        let conn = get_connection(&pool).unwrap();
        let row = get_membership(&conn, -100, account).unwrap().unwrap();
        assert_eq!(row.invite_link, Some(invite_link));
        assert!(row.is_active);
    }
}
