use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use domain::{
    entitlement::{DownloadAccount, PurchaseBatch, PurchaseBatchId, sort_fifo},
    user::UserId,
};
use resume_builder_application::{
    error::{AppError, AppResult},
    ports::outgoing::ledger_store::LedgerStorePort,
};

#[derive(Default)]
struct LedgerTables {
    accounts: HashMap<UserId, DownloadAccount>,
    batches: HashMap<PurchaseBatchId, PurchaseBatch>,
}

/// Process-local ledger. Every conditional update runs under one lock, so
/// it provides the same decrement-if-positive guarantee as the SQL store.
#[derive(Default)]
pub struct InMemoryLedgerStoreAdapter {
    tables: Mutex<LedgerTables>,
}

impl InMemoryLedgerStoreAdapter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl LedgerStorePort for InMemoryLedgerStoreAdapter {
    #[instrument(skip(self))]
    async fn get_account(&self, user_id: &UserId) -> AppResult<Option<DownloadAccount>> {
        Ok(self.tables.lock().await.accounts.get(user_id).cloned())
    }

    #[instrument(skip(self, account))]
    async fn create_account(&self, account: &DownloadAccount) -> AppResult<DownloadAccount> {
        let mut tables = self.tables.lock().await;
        let stored = tables
            .accounts
            .entry(account.user_id.clone())
            .or_insert_with(|| account.clone());
        Ok(stored.clone())
    }

    #[instrument(skip(self))]
    async fn take_free_download(&self, user_id: &UserId) -> AppResult<Option<DownloadAccount>> {
        let mut tables = self.tables.lock().await;
        Ok(tables
            .accounts
            .get_mut(user_id)
            .filter(|account| account.has_free_download())
            .map(|account| {
                account.free_downloads_remaining -= 1;
                account.download_count += 1;
                account.clone()
            }))
    }

    #[instrument(skip(self))]
    async fn list_batches(&self, user_id: &UserId) -> AppResult<Vec<PurchaseBatch>> {
        let tables = self.tables.lock().await;
        let mut batches: Vec<PurchaseBatch> = tables
            .batches
            .values()
            .filter(|batch| &batch.user_id == user_id)
            .cloned()
            .collect();
        sort_fifo(&mut batches);
        Ok(batches)
    }

    #[instrument(skip(self))]
    async fn take_batch_download(
        &self,
        batch_id: &PurchaseBatchId,
    ) -> AppResult<Option<PurchaseBatch>> {
        let mut tables = self.tables.lock().await;
        let Some(batch) = tables.batches.get_mut(batch_id) else {
            return Ok(None);
        };

        if batch.consume_one().is_err() {
            debug!("Purchase batch {} already drained", batch_id);
            return Ok(None);
        }

        Ok(Some(batch.clone()))
    }

    #[instrument(skip(self))]
    async fn increment_download_count(&self, user_id: &UserId) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        if let Some(account) = tables.accounts.get_mut(user_id) {
            account.download_count += 1;
        }
        Ok(())
    }

    #[instrument(skip(self, batch))]
    async fn insert_batch(&self, batch: &PurchaseBatch) -> AppResult<()> {
        let mut tables = self.tables.lock().await;
        if !tables.accounts.contains_key(&batch.user_id) {
            return Err(AppError::DatabaseError {
                message: format!("No download account for user {}", batch.user_id),
            });
        }

        tables.batches.insert(batch.id, batch.clone());
        Ok(())
    }
}
