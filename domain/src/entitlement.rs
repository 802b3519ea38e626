use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter, Result as FmtResult};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::user::UserId;
use crate::error::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PurchaseBatchId(pub Uuid);

impl PurchaseBatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PurchaseBatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for PurchaseBatchId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Limits applied when accounts are provisioned and purchases recorded.
#[derive(Debug, Clone)]
pub struct EntitlementPolicy {
    pub signup_free_downloads: i32,
    pub max_batch_quantity: i32,
}

impl EntitlementPolicy {
    pub fn new(signup_free_downloads: i32, max_batch_quantity: i32) -> DomainResult<Self> {
        if signup_free_downloads < 0 {
            return Err(DomainError::ConfigError {
                message: "signup_free_downloads must be greater than or equal to 0".to_string(),
            });
        }

        if max_batch_quantity <= 0 {
            return Err(DomainError::ConfigError {
                message: "max_batch_quantity must be greater than 0".to_string(),
            });
        }

        Ok(Self {
            signup_free_downloads,
            max_batch_quantity,
        })
    }

    pub fn validate_quantity(&self, quantity: i32) -> DomainResult<()> {
        if quantity <= 0 || quantity > self.max_batch_quantity {
            return Err(DomainError::InvalidQuantity(quantity));
        }
        Ok(())
    }
}

/// Per-user download counters. `download_count` is a display counter and
/// may lag the per-pool counters after a partial failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadAccount {
    pub user_id: UserId,
    pub free_downloads_remaining: i32,
    pub download_count: i32,
}

impl DownloadAccount {
    pub fn new(user_id: UserId, signup_free_downloads: i32) -> Self {
        Self {
            user_id,
            free_downloads_remaining: signup_free_downloads.max(0),
            download_count: 0,
        }
    }

    pub fn has_free_download(&self) -> bool {
        self.free_downloads_remaining > 0
    }
}

/// One purchased block of download credits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurchaseBatch {
    pub id: PurchaseBatchId,
    pub user_id: UserId,
    pub quantity: i32,
    pub used_quantity: i32,
    pub remaining_quantity: i32,
    pub created_at: OffsetDateTime,
}

impl PurchaseBatch {
    pub fn new(user_id: UserId, quantity: i32, created_at: OffsetDateTime) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::InvalidQuantity(quantity));
        }

        Ok(Self {
            id: PurchaseBatchId::new(),
            user_id,
            quantity,
            used_quantity: 0,
            remaining_quantity: quantity,
            created_at,
        })
    }

    pub fn has_remaining(&self) -> bool {
        self.remaining_quantity > 0
    }

    pub fn is_consistent(&self) -> bool {
        self.used_quantity >= 0
            && self.remaining_quantity >= 0
            && self.used_quantity.checked_add(self.remaining_quantity) == Some(self.quantity)
    }

    pub fn consume_one(&mut self) -> DomainResult<()> {
        if !self.has_remaining() {
            return Err(DomainError::BatchExhausted(self.id.to_string()));
        }

        self.remaining_quantity -= 1;
        self.used_quantity += 1;
        Ok(())
    }

    /// Oldest first, ties broken by id so the order is total.
    pub fn fifo_cmp(&self, other: &Self) -> Ordering {
        self.created_at
            .cmp(&other.created_at)
            .then_with(|| self.id.cmp(&other.id))
    }
}

pub fn sort_fifo(batches: &mut [PurchaseBatch]) {
    batches.sort_by(PurchaseBatch::fifo_cmp);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadSource {
    Free,
    Purchased { batch_id: PurchaseBatchId },
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    AccountNotFound,
    NoDownloadsRemaining,
    StorageFailure,
}

impl DenialReason {
    pub fn message(self) -> &'static str {
        match self {
            Self::AccountNotFound => "Account not found.",
            Self::NoDownloadsRemaining => "No downloads remaining. Redirecting to pricing.",
            Self::StorageFailure => "Could not record the download. Please try again.",
        }
    }
}

impl Display for DenialReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumeOutcome {
    Allowed(DownloadSource),
    Denied(DenialReason),
}

impl ConsumeOutcome {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }

    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Allowed(_) => None,
            Self::Denied(reason) => Some(reason.message()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntitlementStatus {
    pub free_downloads_remaining: i32,
    pub purchased_total: i32,
    pub purchased_used: i32,
    pub purchased_remaining: i32,
    pub download_count: i32,
    pub downloads_remaining: i32,
    pub has_downloads: bool,
    pub is_free: bool,
}

impl EntitlementStatus {
    pub fn zeroed() -> Self {
        Self::default()
    }

    pub fn from_ledger(account: &DownloadAccount, batches: &[PurchaseBatch]) -> Self {
        let (purchased_total, purchased_used, purchased_remaining) =
            batches.iter().fold((0i32, 0i32, 0i32), |(total, used, remaining), batch| {
                (
                    total.saturating_add(batch.quantity),
                    used.saturating_add(batch.used_quantity),
                    remaining.saturating_add(batch.remaining_quantity),
                )
            });

        let is_free = account.has_free_download();
        let downloads_remaining = if is_free { 1 } else { purchased_remaining };

        Self {
            free_downloads_remaining: account.free_downloads_remaining,
            purchased_total,
            purchased_used,
            purchased_remaining,
            download_count: account.download_count,
            downloads_remaining,
            has_downloads: is_free || purchased_remaining > 0,
            is_free,
        }
    }
}
