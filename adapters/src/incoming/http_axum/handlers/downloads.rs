#[cfg(feature = "docs")]
use crate::incoming::http_axum::dto::common_responses::RateLimitExceededResponse;
use axum::{Json, extract::State};
use tracing::instrument;

use crate::incoming::http_axum::{
    core::extractors::{UserPath, extract_user_id},
    dto::responses::{ApiResponse, ConsumeDownloadResponse, DownloadStatusResponse},
};
use crate::shared::app_state::AppState;

#[cfg_attr(feature = "docs", utoipa::path(
    post,
    path = "/users/{user_id}/downloads",
    params(("user_id" = uuid::Uuid, Path, description = "Account owner")),
    responses(
        (status = 200, description = "Download granted or denied. Check `allowed`; a denial carries a display message.", body = ConsumeDownloadResponse,
         example = json!({
             "ok": true,
             "data": {
                 "allowed": true,
                 "source": "purchased",
                 "batchId": "550e8400-e29b-41d4-a716-446655440000"
             }
         })
        ),
        (status = 429, response = RateLimitExceededResponse)
    ),
    tag = "downloads",
    summary = "Consume one download",
    description = "Debits the free allowance first, then the oldest purchase batch with credits left. Never fails with a server error: storage problems come back as a denial.",
    operation_id = "consume_download"
))]
#[instrument(skip(state))]
pub async fn consume_download(
    State(state): State<AppState>,
    user_path: UserPath,
) -> Json<ApiResponse<ConsumeDownloadResponse>> {
    let user_id = extract_user_id(user_path);
    let outcome = state.entitlement_use_case.consume(&user_id).await;

    Json(ApiResponse::success_with_data(Some(
        ConsumeDownloadResponse::from(outcome),
    )))
}

#[cfg_attr(feature = "docs", utoipa::path(
    get,
    path = "/users/{user_id}/downloads",
    params(("user_id" = uuid::Uuid, Path, description = "Account owner")),
    responses(
        (status = 200, description = "Current download balance", body = DownloadStatusResponse),
        (status = 429, response = RateLimitExceededResponse)
    ),
    tag = "downloads",
    summary = "Download balance",
    operation_id = "get_download_status"
))]
#[instrument(skip(state))]
pub async fn get_download_status(
    State(state): State<AppState>,
    user_path: UserPath,
) -> Json<ApiResponse<DownloadStatusResponse>> {
    let user_id = extract_user_id(user_path);
    let status = state.entitlement_use_case.status(&user_id).await;

    Json(ApiResponse::success_with_data(Some(
        DownloadStatusResponse::from(status),
    )))
}
