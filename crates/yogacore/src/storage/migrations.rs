use anyhow::{Context, Result};
use rusqlite::Connection;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

mod embedded {
    use refinery::embed_migrations;

    embed_migrations!("./migrations");
}

static MIGRATION_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

/// Applies the embedded SQL migrations that have not run yet.
///
/// Refinery wraps every migration in its own transaction, so no outer
/// transaction is opened here; concurrent runners in one process are
/// serialized by a mutex and across processes by SQLite's busy timeout.
pub fn run_migrations(conn: &mut Connection) -> Result<usize> {
    let mutex = MIGRATION_LOCK.get_or_init(|| Mutex::new(()));
    // Migrations are idempotent, so a poisoned lock is safe to reuse
    let _guard = match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("Migration lock was poisoned, recovering...");
            poisoned.into_inner()
        }
    };

    conn.busy_timeout(Duration::from_secs(30))
        .context("set SQLite busy timeout")?;

    let report = embedded::migrations::runner()
        .run(conn)
        .context("apply migrations")?;

    let applied = report.applied_migrations().len();
    for migration in report.applied_migrations() {
        log::info!("Applied migration {}", migration);
    }
    Ok(applied)
}
