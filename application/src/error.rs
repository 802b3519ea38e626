use thiserror::Error;

use domain::error::DomainError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Bad request: {message}")]
    BadRequest { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Database error: {message}")]
    DatabaseError { message: String },
}

pub type AppResult<T> = Result<T, AppError>;
