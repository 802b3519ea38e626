use crate::incoming::http_axum::{dto, handlers};
use domain::entitlement::DenialReason;
use dto::common_responses::{
    BadRequestResponse, InternalServerErrorResponse, NotFoundResponse, RateLimitExceededResponse,
    ValidationErrorResponse,
};
use dto::requests::RecordPurchaseRequest;
use dto::responses::{
    AccountResponse, ApiResponseValue, ConsumeDownloadResponse, DownloadSourceKind,
    DownloadStatusResponse, PurchaseBatchResponse,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::downloads::consume_download,
        handlers::downloads::get_download_status,
        handlers::accounts::provision_account,
        handlers::purchases::record_purchase,
        handlers::purchases::list_purchases,
        handlers::health::health_check,
    ),
    components(
        schemas(
            ApiResponseValue,
            ConsumeDownloadResponse,
            DownloadSourceKind,
            DenialReason,
            DownloadStatusResponse,
            AccountResponse,
            PurchaseBatchResponse,
            RecordPurchaseRequest
        ),
        responses(
            BadRequestResponse,
            NotFoundResponse,
            RateLimitExceededResponse,
            InternalServerErrorResponse,
            ValidationErrorResponse
        )
    ),
    tags(
        (name = "downloads", description = "Download entitlement - consume one download (free allowance first, then purchase batches oldest first) and read the balance"),
        (name = "accounts", description = "Download account provisioning with the signup allowance"),
        (name = "purchases", description = "Purchase batches - record completed purchases and list them in consumption order"),
        (name = "system", description = "System health and status monitoring")
    ),
    info(
        title = "Resume Builder Download Ledger API",
        description = "Tracks how many document downloads each user may still make. Every debit is a conditional update, so concurrent requests never overdraw a pool. Rate limited endpoints return RateLimit-Limit, RateLimit-Remaining, RateLimit-Reset and Retry-After headers.",
        contact(
            name = "Resume Builder",
        ),
    ),
    servers(
        (url = "http://localhost:3000", description = "Development server"),
    )
)]
pub struct ApiDoc;
