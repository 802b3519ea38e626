#[cfg(feature = "docs")]
use crate::incoming::http_axum::dto::common_responses::{
    BadRequestResponse, InternalServerErrorResponse, NotFoundResponse, RateLimitExceededResponse,
    ValidationErrorResponse,
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;
use validator::Validate;

use crate::incoming::http_axum::{
    core::extractors::{UserPath, extract_user_id},
    dto::{
        requests::RecordPurchaseRequest,
        responses::{ApiResponse, PurchaseBatchResponse},
    },
    error_mapper::HttpError,
};
use crate::shared::app_state::AppState;
use resume_builder_application::error::AppError;

#[cfg_attr(feature = "docs", utoipa::path(
    post,
    path = "/users/{user_id}/purchases",
    params(("user_id" = uuid::Uuid, Path, description = "Buyer")),
    request_body = RecordPurchaseRequest,
    responses(
        (status = 201, description = "Purchase batch recorded", body = PurchaseBatchResponse),
        (status = 400, response = BadRequestResponse),
        (status = 404, response = NotFoundResponse),
        (status = 422, response = ValidationErrorResponse),
        (status = 429, response = RateLimitExceededResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    tag = "purchases",
    summary = "Record a completed purchase",
    operation_id = "record_purchase"
))]
#[instrument(skip(state))]
pub async fn record_purchase(
    State(state): State<AppState>,
    user_path: UserPath,
    payload: Result<Json<RecordPurchaseRequest>, JsonRejection>,
) -> Result<impl IntoResponse, HttpError> {
    let Json(request) = payload.map_err(|rejection| {
        HttpError(AppError::BadRequest {
            message: rejection.body_text(),
        })
    })?;

    if let Err(e) = request.validate() {
        return Err(HttpError(AppError::ValidationError {
            message: format!("Validation failed: {}", e),
        }));
    }

    let user_id = extract_user_id(user_path);
    let batch = state
        .entitlement_use_case
        .record_purchase(&user_id, request.quantity)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success_with_data(Some(
            PurchaseBatchResponse::from(batch),
        ))),
    ))
}

#[cfg_attr(feature = "docs", utoipa::path(
    get,
    path = "/users/{user_id}/purchases",
    params(("user_id" = uuid::Uuid, Path, description = "Buyer")),
    responses(
        (status = 200, description = "Purchase batches, oldest first", body = Vec<PurchaseBatchResponse>),
        (status = 404, response = NotFoundResponse),
        (status = 429, response = RateLimitExceededResponse),
        (status = 500, response = InternalServerErrorResponse)
    ),
    tag = "purchases",
    summary = "Purchase history",
    operation_id = "list_purchases"
))]
#[instrument(skip(state))]
pub async fn list_purchases(
    State(state): State<AppState>,
    user_path: UserPath,
) -> Result<Json<ApiResponse<Vec<PurchaseBatchResponse>>>, HttpError> {
    let user_id = extract_user_id(user_path);
    let batches = state
        .entitlement_use_case
        .purchase_history(&user_id)
        .await?;

    Ok(Json(ApiResponse::success_with_data(Some(
        batches.into_iter().map(PurchaseBatchResponse::from).collect(),
    ))))
}
