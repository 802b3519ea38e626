use std::sync::Arc;

use crate::error::AppResult;
use domain::{
    entitlement::{DownloadAccount, PurchaseBatch, PurchaseBatchId},
    user::UserId,
};

/// Persistence for download accounts and purchase batches.
///
/// The `take_*` methods are conditional updates: they apply only while the
/// targeted counter is positive and return `None` when nothing changed.
#[async_trait::async_trait]
pub trait LedgerStorePort: Send + Sync {
    async fn get_account(&self, user_id: &UserId) -> AppResult<Option<DownloadAccount>>;

    /// Inserts the account unless one exists and returns the stored row.
    async fn create_account(&self, account: &DownloadAccount) -> AppResult<DownloadAccount>;

    /// Decrements the free allowance and bumps `download_count` in one step.
    async fn take_free_download(&self, user_id: &UserId) -> AppResult<Option<DownloadAccount>>;

    /// Batches ordered oldest first.
    async fn list_batches(&self, user_id: &UserId) -> AppResult<Vec<PurchaseBatch>>;

    async fn take_batch_download(
        &self,
        batch_id: &PurchaseBatchId,
    ) -> AppResult<Option<PurchaseBatch>>;

    async fn increment_download_count(&self, user_id: &UserId) -> AppResult<()>;

    async fn insert_batch(&self, batch: &PurchaseBatch) -> AppResult<()>;
}

pub type DynLedgerStorePort = Arc<dyn LedgerStorePort>;
