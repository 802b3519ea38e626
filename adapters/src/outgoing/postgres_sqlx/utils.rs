use resume_builder_application::error::{AppError, AppResult};
use sqlx::{Decode, Postgres, Row, Type, postgres::PgRow};
use std::{future::Future, time::Duration};
use tokio::time::timeout;
use tracing::warn;

/// Bounds every ledger statement by the configured query timeout. A timed
/// out statement surfaces as `DatabaseError`, which `consume` turns into a
/// storage-failure denial.
pub struct PostgresExecutor {
    query_timeout: Duration,
}

impl PostgresExecutor {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            query_timeout: Duration::from_secs(timeout_secs),
        }
    }

    pub async fn execute_with_timeout<T, F, Fut>(
        &self,
        operation: F,
        error_context: &str,
    ) -> AppResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, sqlx::Error>>,
    {
        let Ok(result) = timeout(self.query_timeout, operation()).await else {
            warn!(
                timeout_secs = self.query_timeout.as_secs(),
                "{}: query timed out", error_context
            );
            return Err(AppError::DatabaseError {
                message: format!("{}: query timed out", error_context),
            });
        };

        result.map_err(|e| AppError::DatabaseError {
            message: format!("{}: {}", error_context, e),
        })
    }
}

pub fn column<T>(row: &PgRow, name: &str) -> AppResult<T>
where
    T: for<'r> Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get(name).map_err(|e| AppError::DatabaseError {
        message: format!("Failed to read column {}: {}", name, e),
    })
}
