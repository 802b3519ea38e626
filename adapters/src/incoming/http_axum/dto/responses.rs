use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
#[cfg(feature = "docs")]
use utoipa::ToSchema;
use uuid::Uuid;

use domain::entitlement::{
    ConsumeOutcome, DenialReason, DownloadAccount, DownloadSource, EntitlementStatus,
    PurchaseBatch,
};

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(
    description = "Standard API response wrapper with success indicator, optional error message, and optional data payload",
    example = json!({
        "ok": true,
        "data": {
            "allowed": true,
            "source": "free"
        }
    })
))]
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    #[must_use]
    pub fn success_with_data(data: Option<T>) -> Self {
        Self {
            ok: true,
            error: None,
            data,
        }
    }
}

fn format_datetime(dt: OffsetDateTime) -> String {
    dt.format(&Rfc3339).unwrap_or_else(|_| dt.to_string())
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadSourceKind {
    Free,
    Purchased,
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(
    description = "Result of a download attempt. A denial is a normal result, not an HTTP error, and always carries a message suitable for display.",
    example = json!({
        "allowed": false,
        "message": "No downloads remaining. Redirecting to pricing.",
        "reason": "no_downloads_remaining"
    })
))]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeDownloadResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<DenialReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<DownloadSourceKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_id: Option<Uuid>,
}

impl From<ConsumeOutcome> for ConsumeDownloadResponse {
    fn from(outcome: ConsumeOutcome) -> Self {
        match outcome {
            ConsumeOutcome::Allowed(DownloadSource::Free) => Self {
                allowed: true,
                message: None,
                reason: None,
                source: Some(DownloadSourceKind::Free),
                batch_id: None,
            },
            ConsumeOutcome::Allowed(DownloadSource::Purchased { batch_id }) => Self {
                allowed: true,
                message: None,
                reason: None,
                source: Some(DownloadSourceKind::Purchased),
                batch_id: Some(*batch_id.as_uuid()),
            },
            ConsumeOutcome::Denied(reason) => Self {
                allowed: false,
                message: Some(reason.message().to_string()),
                reason: Some(reason),
                source: None,
                batch_id: None,
            },
        }
    }
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(
    description = "Download balance. Unknown accounts report all zeroes.",
    example = json!({
        "freeDownloadsRemaining": 0,
        "purchasedTotal": 10,
        "purchasedUsed": 4,
        "purchasedRemaining": 6,
        "downloadCount": 5,
        "downloadsRemaining": 6,
        "hasDownloads": true,
        "isFree": false
    })
))]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadStatusResponse {
    pub free_downloads_remaining: i32,
    pub purchased_total: i32,
    pub purchased_used: i32,
    pub purchased_remaining: i32,
    pub download_count: i32,
    pub downloads_remaining: i32,
    pub has_downloads: bool,
    pub is_free: bool,
}

impl From<EntitlementStatus> for DownloadStatusResponse {
    fn from(status: EntitlementStatus) -> Self {
        Self {
            free_downloads_remaining: status.free_downloads_remaining,
            purchased_total: status.purchased_total,
            purchased_used: status.purchased_used,
            purchased_remaining: status.purchased_remaining,
            download_count: status.download_count,
            downloads_remaining: status.downloads_remaining,
            has_downloads: status.has_downloads,
            is_free: status.is_free,
        }
    }
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub user_id: Uuid,
    pub free_downloads_remaining: i32,
    pub download_count: i32,
}

impl From<DownloadAccount> for AccountResponse {
    fn from(account: DownloadAccount) -> Self {
        Self {
            user_id: *account.user_id.as_uuid(),
            free_downloads_remaining: account.free_downloads_remaining,
            download_count: account.download_count,
        }
    }
}

#[cfg_attr(feature = "docs", derive(ToSchema))]
#[cfg_attr(feature = "docs", schema(
    example = json!({
        "id": "550e8400-e29b-41d4-a716-446655440000",
        "userId": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
        "quantity": 10,
        "usedQuantity": 4,
        "remainingQuantity": 6,
        "createdAt": "2025-03-01T12:00:00Z"
    })
))]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseBatchResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub quantity: i32,
    pub used_quantity: i32,
    pub remaining_quantity: i32,
    pub created_at: String,
}

impl From<PurchaseBatch> for PurchaseBatchResponse {
    fn from(batch: PurchaseBatch) -> Self {
        Self {
            id: *batch.id.as_uuid(),
            user_id: *batch.user_id.as_uuid(),
            quantity: batch.quantity,
            used_quantity: batch.used_quantity,
            remaining_quantity: batch.remaining_quantity,
            created_at: format_datetime(batch.created_at),
        }
    }
}

#[cfg(feature = "docs")]
#[derive(serde::Serialize, utoipa::ToSchema)]
#[schema(title = "ApiResponseValue")]
pub struct ApiResponseValue {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}
