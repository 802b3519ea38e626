use time::OffsetDateTime;
use tracing::{debug, error, info, instrument, warn};

use crate::error::{AppError, AppResult};
use crate::ports::incoming::entitlement::EntitlementUseCase;
use crate::ports::outgoing::ledger_store::DynLedgerStorePort;
use domain::{
    entitlement::{
        ConsumeOutcome, DenialReason, DownloadAccount, DownloadSource, EntitlementPolicy,
        EntitlementStatus, PurchaseBatch, sort_fifo,
    },
    user::UserId,
};

pub struct EntitlementService {
    ledger_store: DynLedgerStorePort,
    policy: EntitlementPolicy,
}

impl EntitlementService {
    pub fn new(ledger_store: DynLedgerStorePort, policy: EntitlementPolicy) -> Self {
        Self {
            ledger_store,
            policy,
        }
    }

    async fn require_account(&self, user_id: &UserId) -> AppResult<DownloadAccount> {
        self.ledger_store
            .get_account(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound {
                message: "Account not found".to_string(),
            })
    }

    async fn load_status(&self, user_id: &UserId) -> AppResult<Option<EntitlementStatus>> {
        let Some(account) = self.ledger_store.get_account(user_id).await? else {
            return Ok(None);
        };
        let batches = self.ledger_store.list_batches(user_id).await?;

        Ok(Some(EntitlementStatus::from_ledger(&account, &batches)))
    }

    async fn consume_purchased(&self, user_id: &UserId) -> ConsumeOutcome {
        let mut batches = match self.ledger_store.list_batches(user_id).await {
            Ok(batches) => batches,
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to list purchase batches");
                return ConsumeOutcome::Denied(DenialReason::StorageFailure);
            }
        };
        sort_fifo(&mut batches);

        for batch in batches.iter().filter(|batch| batch.has_remaining()) {
            if !batch.is_consistent() {
                warn!(
                    user_id = %user_id,
                    batch_id = %batch.id,
                    quantity = batch.quantity,
                    used_quantity = batch.used_quantity,
                    remaining_quantity = batch.remaining_quantity,
                    "Skipping purchase batch with inconsistent counters"
                );
                continue;
            }

            match self.ledger_store.take_batch_download(&batch.id).await {
                Ok(Some(updated)) => {
                    self.bump_download_count(user_id).await;
                    info!(
                        user_id = %user_id,
                        batch_id = %updated.id,
                        remaining_quantity = updated.remaining_quantity,
                        "Consumed purchased download"
                    );
                    return ConsumeOutcome::Allowed(DownloadSource::Purchased {
                        batch_id: updated.id,
                    });
                }
                Ok(None) => {
                    debug!(batch_id = %batch.id, "Purchase batch drained concurrently");
                }
                Err(e) => {
                    error!(
                        user_id = %user_id,
                        batch_id = %batch.id,
                        error = %e,
                        "Failed to debit purchase batch"
                    );
                    return ConsumeOutcome::Denied(DenialReason::StorageFailure);
                }
            }
        }

        debug!(user_id = %user_id, "No downloads remaining");
        ConsumeOutcome::Denied(DenialReason::NoDownloadsRemaining)
    }

    // The batch debit is the entitlement of record; the counter may lag it.
    async fn bump_download_count(&self, user_id: &UserId) {
        if let Err(e) = self.ledger_store.increment_download_count(user_id).await {
            warn!(
                user_id = %user_id,
                error = %e,
                "Batch debited but download_count was not incremented"
            );
        }
    }
}

#[async_trait::async_trait]
impl EntitlementUseCase for EntitlementService {
    #[instrument(skip(self))]
    async fn consume(&self, user_id: &UserId) -> ConsumeOutcome {
        let account = match self.ledger_store.get_account(user_id).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                debug!(user_id = %user_id, "Download requested for unknown account");
                return ConsumeOutcome::Denied(DenialReason::AccountNotFound);
            }
            Err(e) => {
                error!(user_id = %user_id, error = %e, "Failed to load download account");
                return ConsumeOutcome::Denied(DenialReason::StorageFailure);
            }
        };

        if account.has_free_download() {
            match self.ledger_store.take_free_download(user_id).await {
                Ok(Some(updated)) => {
                    info!(
                        user_id = %user_id,
                        free_downloads_remaining = updated.free_downloads_remaining,
                        download_count = updated.download_count,
                        "Consumed free download"
                    );
                    return ConsumeOutcome::Allowed(DownloadSource::Free);
                }
                Ok(None) => {
                    debug!(user_id = %user_id, "Free allowance drained concurrently");
                }
                Err(e) => {
                    error!(user_id = %user_id, error = %e, "Failed to debit free allowance");
                    return ConsumeOutcome::Denied(DenialReason::StorageFailure);
                }
            }
        }

        self.consume_purchased(user_id).await
    }

    #[instrument(skip(self))]
    async fn status(&self, user_id: &UserId) -> EntitlementStatus {
        match self.load_status(user_id).await {
            Ok(Some(status)) => status,
            Ok(None) => {
                debug!(user_id = %user_id, "Status requested for unknown account");
                EntitlementStatus::zeroed()
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Failed to load entitlement status");
                EntitlementStatus::zeroed()
            }
        }
    }

    #[instrument(skip(self))]
    async fn provision_account(&self, user_id: &UserId) -> AppResult<DownloadAccount> {
        let account = DownloadAccount::new(user_id.clone(), self.policy.signup_free_downloads);
        let stored = self.ledger_store.create_account(&account).await?;

        info!(
            user_id = %user_id,
            free_downloads_remaining = stored.free_downloads_remaining,
            "Download account provisioned"
        );

        Ok(stored)
    }

    #[instrument(skip(self))]
    async fn record_purchase(&self, user_id: &UserId, quantity: i32) -> AppResult<PurchaseBatch> {
        self.policy
            .validate_quantity(quantity)
            .map_err(|e| AppError::ValidationError {
                message: e.to_string(),
            })?;
        self.require_account(user_id).await?;

        let batch = PurchaseBatch::new(user_id.clone(), quantity, OffsetDateTime::now_utc())?;
        self.ledger_store.insert_batch(&batch).await?;

        info!(
            user_id = %user_id,
            batch_id = %batch.id,
            quantity = quantity,
            "Purchase batch recorded"
        );

        Ok(batch)
    }

    #[instrument(skip(self))]
    async fn purchase_history(&self, user_id: &UserId) -> AppResult<Vec<PurchaseBatch>> {
        self.require_account(user_id).await?;

        let mut batches = self.ledger_store.list_batches(user_id).await?;
        sort_fifo(&mut batches);
        Ok(batches)
    }
}
