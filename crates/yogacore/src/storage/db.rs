use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use std::time::Duration;

use crate::error::{AppError, AppResult};
use crate::storage::migrations::run_migrations;

pub type DbPool = Pool<SqliteConnectionManager>;
pub type DbConnection = PooledConnection<SqliteConnectionManager>;

/// Create a new database connection pool
///
/// Every checkout runs a liveness check first, so a connection that went
/// stale is replaced transparently instead of failing the next statement.
/// Foreign keys are enforced on every connection. Schema migrations run once
/// on creation.
///
/// # Arguments
///
/// * `database_path` - Path to SQLite database file
/// * `max_size` - Maximum number of pooled connections
///
/// # Example
///
/// ```no_run
/// use yogacore::storage;
///
/// let pool = storage::create_pool("database.sqlite", 4)?;
/// # Ok::<(), yogacore::AppError>(())
/// ```
pub fn create_pool(database_path: &str, max_size: u32) -> AppResult<DbPool> {
    let manager = SqliteConnectionManager::file(database_path)
        .with_init(|conn| {
            conn.busy_timeout(Duration::from_secs(5))?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")
        });
    let pool = Pool::builder()
        .max_size(max_size)
        .test_on_check_out(true)
        .build(manager)?;

    let mut conn = pool.get()?;
    run_migrations(&mut conn).map_err(|e| AppError::Migration(format!("{:#}", e)))?;

    log::info!("Database pool ready: {} (max {} connections)", database_path, max_size);
    Ok(pool)
}

/// Get a connection from the pool
///
/// The connection is returned to the pool when dropped, so callers hold it
/// only for the statements of a single operation.
pub fn get_connection(pool: &DbPool) -> AppResult<DbConnection> {
    Ok(pool.get()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn pool_runs_migrations_and_enforces_foreign_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.sqlite");
        let pool = create_pool(path.to_str().unwrap(), 2).unwrap();

        let conn = get_connection(&pool).unwrap();
        let fk: i64 = conn.query_row("PRAGMA foreign_keys", [], |row| row.get(0)).unwrap();
        assert_eq!(fk, 1);

        let err = conn
            .execute(
                "INSERT INTO subscriptions (account_id, plan_id, status, created_at) VALUES (999, 999, 'active', '2024-01-01 00:00:00')",
                [],
            )
            .unwrap_err();
        assert!(err.to_string().contains("FOREIGN KEY"));
    }

    #[test]
    fn reopening_existing_database_is_fine() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("test.sqlite");
        let path = path.to_str().unwrap();

        drop(create_pool(path, 1).unwrap());
        let pool = create_pool(path, 1).unwrap();
        let plans: i64 = get_connection(&pool)
            .unwrap()
            .query_row("SELECT COUNT(*) FROM subscription_plans", [], |row| row.get(0))
            .unwrap();
        assert_eq!(plans, 3, "seed migration must not run twice");
    }
}
