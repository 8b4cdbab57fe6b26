use std::{future::Future, path::PathBuf, time::Duration};

use anyhow::Result;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, RuntimeErr, SqlxPostgresConnector, Statement,
};
use sqlx::postgres::{PgPool, PgPoolOptions};
use tokio::fs;

use crate::error::{AppError, AppResult};

pub type DbPool = PgPool;
pub type OrmConn = DatabaseConnection;

/// SQLSTATEs raised when the server drops the session under us.
const TRANSIENT_SQLSTATES: [&str; 3] = ["57P01", "08006", "08003"];

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Wrap the sqlx pool in a SeaORM connection so both layers share connections.
pub fn orm_from_pool(pool: &DbPool) -> OrmConn {
    SqlxPostgresConnector::from_sqlx_postgres_pool(pool.clone())
}

/// Minimal migration runner that executes SQL files in `migrations/` in filename order.
/// Every file must be idempotent: the whole directory is replayed on each start.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<()> {
    let mut entries = fs::read_dir("migrations").await?;
    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();

    let backend = conn.get_database_backend();
    for file in files {
        tracing::debug!(file = %file.display(), "applying migration");
        let sql = fs::read_to_string(&file).await?;
        // Postgres prepared statements cannot contain multiple commands,
        // so split the migration file and run each statement individually.
        for stmt in sql.split(';') {
            let stmt = stmt.trim();
            if stmt.is_empty() {
                continue;
            }
            let statement = format!("{stmt};");
            conn.execute(Statement::from_string(backend, statement))
                .await?;
        }
    }

    Ok(())
}

pub fn is_transient(err: &DbErr) -> bool {
    match err {
        DbErr::ConnectionAcquire(_) => true,
        DbErr::Conn(RuntimeErr::SqlxError(e))
        | DbErr::Exec(RuntimeErr::SqlxError(e))
        | DbErr::Query(RuntimeErr::SqlxError(e)) => is_transient_sqlx(e),
        _ => false,
    }
}

pub fn is_transient_sqlx(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| TRANSIENT_SQLSTATES.contains(&code.as_ref())),
        _ => false,
    }
}

/// Run `op`, retrying once after `delay` when the first failure is a dropped
/// connection. A second transient failure becomes `ServiceUnavailable`.
pub async fn retry_transient<T, F, Fut>(delay: Duration, mut op: F) -> AppResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DbErr>>,
{
    match op().await {
        Ok(value) => Ok(value),
        Err(err) if is_transient(&err) => {
            tracing::warn!(error = %err, delay_ms = %delay.as_millis(), "transient database error, retrying once");
            tokio::time::sleep(delay).await;
            match op().await {
                Ok(value) => Ok(value),
                Err(err) if is_transient(&err) => {
                    tracing::error!(error = %err, "database still unavailable after retry");
                    Err(AppError::ServiceUnavailable)
                }
                Err(err) => Err(err.into()),
            }
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::error::ConnAcquireErr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn acquire_timeouts_and_dropped_sockets_are_transient() {
        assert!(is_transient(&DbErr::ConnectionAcquire(ConnAcquireErr::Timeout)));
        assert!(is_transient(&DbErr::Query(RuntimeErr::SqlxError(
            sqlx::Error::PoolTimedOut
        ))));
        assert!(!is_transient(&DbErr::RecordNotFound("product".into())));
        assert!(!is_transient(&DbErr::Custom("boom".into())));
    }

    #[tokio::test]
    async fn retries_exactly_once_then_succeeds() {
        let attempts = AtomicUsize::new(0);
        let result = retry_transient(Duration::from_millis(0), || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(DbErr::ConnectionAcquire(ConnAcquireErr::ConnectionClosed))
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.ok(), Some(42));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_transient_failure_is_service_unavailable() {
        let attempts = AtomicUsize::new(0);
        let result: AppResult<()> = retry_transient(Duration::from_millis(0), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout)) }
        })
        .await;
        assert!(matches!(result, Err(AppError::ServiceUnavailable)));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn non_transient_errors_are_not_retried() {
        let attempts = AtomicUsize::new(0);
        let result: AppResult<()> = retry_transient(Duration::from_millis(0), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(DbErr::Custom("bad query".into())) }
        })
        .await;
        assert!(matches!(result, Err(AppError::OrmError(_))));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
