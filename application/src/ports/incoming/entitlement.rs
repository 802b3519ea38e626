use crate::error::AppResult;
use domain::{
    entitlement::{ConsumeOutcome, DownloadAccount, EntitlementStatus, PurchaseBatch},
    user::UserId,
};

#[async_trait::async_trait]
pub trait EntitlementUseCase: Send + Sync {
    /// Debits one download from the free allowance or, once that is spent,
    /// from the oldest purchase batch with credits left. Failures resolve to
    /// a denial.
    async fn consume(&self, user_id: &UserId) -> ConsumeOutcome;

    /// Read-only balance snapshot. Unknown accounts and storage failures
    /// yield a zeroed snapshot.
    async fn status(&self, user_id: &UserId) -> EntitlementStatus;

    async fn provision_account(&self, user_id: &UserId) -> AppResult<DownloadAccount>;

    async fn record_purchase(&self, user_id: &UserId, quantity: i32) -> AppResult<PurchaseBatch>;

    async fn purchase_history(&self, user_id: &UserId) -> AppResult<Vec<PurchaseBatch>>;
}
