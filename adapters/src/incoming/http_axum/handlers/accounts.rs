#[cfg(feature = "docs")]
use crate::incoming::http_axum::dto::common_responses::{
    InternalServerErrorResponse, RateLimitExceededResponse,
};
use axum::{Json, extract::State};
use tracing::instrument;

use crate::incoming::http_axum::{
    core::extractors::{UserPath, extract_user_id},
    dto::responses::{AccountResponse, ApiResponse},
    error_mapper::HttpError,
};
use crate::shared::app_state::AppState;

#[cfg_attr(feature = "docs", utoipa::path(
    post,
    path = "/users/{user_id}/account",
    params(("user_id" = uuid::Uuid, Path, description = "Newly registered user")),
    responses(
        (status = 200, description = "Account created with the signup allowance, or the existing account", body = AccountResponse),
        (status = 429, response = RateLimitExceededResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    tag = "accounts",
    summary = "Provision a download account",
    operation_id = "provision_account"
))]
#[instrument(skip(state))]
pub async fn provision_account(
    State(state): State<AppState>,
    user_path: UserPath,
) -> Result<Json<ApiResponse<AccountResponse>>, HttpError> {
    let user_id = extract_user_id(user_path);
    let account = state
        .entitlement_use_case
        .provision_account(&user_id)
        .await?;

    Ok(Json(ApiResponse::success_with_data(Some(
        AccountResponse::from(account),
    ))))
}
