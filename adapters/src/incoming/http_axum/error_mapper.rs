use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{debug, error};

use resume_builder_application::error::AppError;

pub struct HttpError(pub AppError);

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let app_error = &self.0;

        match app_error {
            AppError::Domain(_)
            | AppError::ValidationError { .. }
            | AppError::BadRequest { .. }
            | AppError::NotFound { .. } => {
                debug!("Client error response generated: {}", app_error);
            }
            _ => {
                error!("Server error response generated: {}", app_error);
            }
        }

        let (status_code, message) = match app_error {
            AppError::Domain(_) | AppError::ValidationError { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, app_error.to_string())
            }

            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message.clone()),

            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message.clone()),

            AppError::ConfigError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Configuration error".to_string(),
            ),

            AppError::DatabaseError { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error".to_string(),
            ),
        };

        let error_response = json!({
            "ok": false,
            "error": message,
            "status": status_code.as_u16()
        });

        (status_code, Json(error_response)).into_response()
    }
}

impl From<AppError> for HttpError {
    fn from(app_error: AppError) -> Self {
        HttpError(app_error)
    }
}
