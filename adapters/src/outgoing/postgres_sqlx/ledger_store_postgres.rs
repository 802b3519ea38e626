use sqlx::{PgPool, postgres::PgRow};
use time::OffsetDateTime;
use tracing::{debug, instrument};
use uuid::Uuid;

use domain::{
    entitlement::{DownloadAccount, PurchaseBatch, PurchaseBatchId},
    user::UserId,
};
use resume_builder_application::{
    error::{AppError, AppResult},
    ports::outgoing::ledger_store::LedgerStorePort,
};

use super::utils::{PostgresExecutor, column};

const ACCOUNT_COLUMNS: &str = "id, free_downloads_remaining, download_count";
const BATCH_COLUMNS: &str =
    "id, user_id, quantity, used_quantity, remaining_quantity, created_at";

pub struct PostgresLedgerStoreAdapter {
    pool: PgPool,
    executor: PostgresExecutor,
}

impl PostgresLedgerStoreAdapter {
    pub fn new(pool: PgPool, query_timeout_secs: u64) -> Self {
        Self {
            pool,
            executor: PostgresExecutor::new(query_timeout_secs),
        }
    }
}

fn account_from_row(row: &PgRow) -> AppResult<DownloadAccount> {
    Ok(DownloadAccount {
        user_id: UserId::from_uuid(column::<Uuid>(row, "id")?),
        free_downloads_remaining: column(row, "free_downloads_remaining")?,
        download_count: column(row, "download_count")?,
    })
}

fn batch_from_row(row: &PgRow) -> AppResult<PurchaseBatch> {
    Ok(PurchaseBatch {
        id: PurchaseBatchId::from_uuid(column::<Uuid>(row, "id")?),
        user_id: UserId::from_uuid(column::<Uuid>(row, "user_id")?),
        quantity: column(row, "quantity")?,
        used_quantity: column(row, "used_quantity")?,
        remaining_quantity: column(row, "remaining_quantity")?,
        created_at: column::<OffsetDateTime>(row, "created_at")?,
    })
}

#[async_trait::async_trait]
impl LedgerStorePort for PostgresLedgerStoreAdapter {
    #[instrument(skip(self))]
    async fn get_account(&self, user_id: &UserId) -> AppResult<Option<DownloadAccount>> {
        let query = format!("SELECT {ACCOUNT_COLUMNS} FROM profiles WHERE id = $1");
        let row = self
            .executor
            .execute_with_timeout(
                || {
                    sqlx::query(&query)
                        .bind(user_id.as_uuid())
                        .fetch_optional(&self.pool)
                },
                &format!("Failed to get download account for user {}", user_id),
            )
            .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    #[instrument(skip(self, account))]
    async fn create_account(&self, account: &DownloadAccount) -> AppResult<DownloadAccount> {
        let inserted = self
            .executor
            .execute_with_timeout(
                || {
                    sqlx::query(
                        r"
                    INSERT INTO profiles (id, free_downloads_remaining, download_count)
                    VALUES ($1, $2, $3)
                    ON CONFLICT (id) DO NOTHING
                    ",
                    )
                    .bind(account.user_id.as_uuid())
                    .bind(account.free_downloads_remaining)
                    .bind(account.download_count)
                    .execute(&self.pool)
                },
                &format!(
                    "Failed to create download account for user {}",
                    account.user_id
                ),
            )
            .await?;

        debug!(
            "Download account for user {} {}",
            account.user_id,
            if inserted.rows_affected() == 1 {
                "created"
            } else {
                "already existed"
            }
        );

        self.get_account(&account.user_id)
            .await?
            .ok_or_else(|| AppError::DatabaseError {
                message: format!(
                    "Download account for user {} vanished after insert",
                    account.user_id
                ),
            })
    }

    #[instrument(skip(self))]
    async fn take_free_download(&self, user_id: &UserId) -> AppResult<Option<DownloadAccount>> {
        let query = format!(
            r"
            UPDATE profiles
            SET free_downloads_remaining = free_downloads_remaining - 1,
                download_count = download_count + 1
            WHERE id = $1 AND free_downloads_remaining > 0
            RETURNING {ACCOUNT_COLUMNS}
            "
        );
        let row = self
            .executor
            .execute_with_timeout(
                || {
                    sqlx::query(&query)
                        .bind(user_id.as_uuid())
                        .fetch_optional(&self.pool)
                },
                &format!("Failed to debit free download for user {}", user_id),
            )
            .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn list_batches(&self, user_id: &UserId) -> AppResult<Vec<PurchaseBatch>> {
        let query = format!(
            r"
            SELECT {BATCH_COLUMNS}
            FROM document_purchases
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "
        );
        let rows = self
            .executor
            .execute_with_timeout(
                || {
                    sqlx::query(&query)
                        .bind(user_id.as_uuid())
                        .fetch_all(&self.pool)
                },
                &format!("Failed to list purchase batches for user {}", user_id),
            )
            .await?;

        rows.iter().map(batch_from_row).collect()
    }

    #[instrument(skip(self))]
    async fn take_batch_download(
        &self,
        batch_id: &PurchaseBatchId,
    ) -> AppResult<Option<PurchaseBatch>> {
        let query = format!(
            r"
            UPDATE document_purchases
            SET used_quantity = used_quantity + 1,
                remaining_quantity = remaining_quantity - 1
            WHERE id = $1 AND remaining_quantity > 0
            RETURNING {BATCH_COLUMNS}
            "
        );
        let row = self
            .executor
            .execute_with_timeout(
                || {
                    sqlx::query(&query)
                        .bind(batch_id.as_uuid())
                        .fetch_optional(&self.pool)
                },
                &format!("Failed to debit purchase batch {}", batch_id),
            )
            .await?;

        row.as_ref().map(batch_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn increment_download_count(&self, user_id: &UserId) -> AppResult<()> {
        self.executor
            .execute_with_timeout(
                || {
                    sqlx::query(
                        r"
                    UPDATE profiles
                    SET download_count = download_count + 1
                    WHERE id = $1
                    ",
                    )
                    .bind(user_id.as_uuid())
                    .execute(&self.pool)
                },
                &format!("Failed to increment download count for user {}", user_id),
            )
            .await?;

        Ok(())
    }

    #[instrument(skip(self, batch))]
    async fn insert_batch(&self, batch: &PurchaseBatch) -> AppResult<()> {
        self.executor
            .execute_with_timeout(
                || {
                    sqlx::query(
                        r"
                    INSERT INTO document_purchases
                        (id, user_id, quantity, used_quantity, remaining_quantity, created_at)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    ",
                    )
                    .bind(batch.id.as_uuid())
                    .bind(batch.user_id.as_uuid())
                    .bind(batch.quantity)
                    .bind(batch.used_quantity)
                    .bind(batch.remaining_quantity)
                    .bind(batch.created_at)
                    .execute(&self.pool)
                },
                &format!("Failed to insert purchase batch {}", batch.id),
            )
            .await?;

        debug!(
            "Inserted purchase batch {} for user {} with {} downloads",
            batch.id, batch.user_id, batch.quantity
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outgoing::postgres_sqlx::migrations::run_migrations;
    use sqlx::postgres::PgPoolOptions;
    use std::env;
    use std::sync::Arc;
    use time::Duration;

    // Needs a disposable database: `DATABASE_URL=... cargo test -- --ignored`.
    async fn connect() -> Option<Arc<PostgresLedgerStoreAdapter>> {
        let url = env::var("DATABASE_URL").ok()?;
        let pool = PgPoolOptions::new()
            .max_connections(8)
            .connect(&url)
            .await
            .unwrap();
        run_migrations(&pool).await.unwrap();
        Some(Arc::new(PostgresLedgerStoreAdapter::new(pool, 5)))
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn conditional_debits_never_overdraw() {
        let Some(store) = connect().await else {
            return;
        };
        let user_id = UserId::new();
        store
            .create_account(&DownloadAccount::new(user_id.clone(), 1))
            .await
            .unwrap();
        let batch = PurchaseBatch::new(
            user_id.clone(),
            2,
            OffsetDateTime::now_utc() - Duration::minutes(1),
        )
        .unwrap();
        store.insert_batch(&batch).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let user_id = user_id.clone();
            let batch_id = batch.id;
            handles.push(tokio::spawn(async move {
                let free = store.take_free_download(&user_id).await.unwrap().is_some();
                let paid = store.take_batch_download(&batch_id).await.unwrap().is_some();
                (free, paid)
            }));
        }

        let mut free_grants = 0;
        let mut paid_grants = 0;
        for handle in handles {
            let (free, paid) = handle.await.unwrap();
            free_grants += i32::from(free);
            paid_grants += i32::from(paid);
        }

        assert_eq!((free_grants, paid_grants), (1, 2));
        let account = store.get_account(&user_id).await.unwrap().unwrap();
        assert_eq!(account.free_downloads_remaining, 0);
        assert_eq!(account.download_count, 1);
        let stored = store.list_batches(&user_id).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored.iter().all(|b| b.remaining_quantity == 0 && b.is_consistent()));
    }

    #[tokio::test]
    #[ignore = "requires DATABASE_URL"]
    async fn create_account_is_idempotent() {
        let Some(store) = connect().await else {
            return;
        };
        let user_id = UserId::new();

        let first = store
            .create_account(&DownloadAccount::new(user_id.clone(), 1))
            .await
            .unwrap();
        store.take_free_download(&user_id).await.unwrap();
        let second = store
            .create_account(&DownloadAccount::new(user_id.clone(), 1))
            .await
            .unwrap();

        assert_eq!(first.free_downloads_remaining, 1);
        assert_eq!(second.free_downloads_remaining, 0);
        assert_eq!(second.download_count, 1);
    }
}
