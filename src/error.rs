use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum Error {
    #[error("database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("jwt error: {0}")]
    JWTError(#[from] jsonwebtoken::errors::Error),

    #[error("invalid input: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("business error: {0}")]
    BusinessError(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("config error: {0}")]
    ConfigError(String),
}

impl Error {
    pub fn code(&self) -> &'static str {
        match self {
            Error::DatabaseError(_) => "DATABASE_ERROR",
            Error::MigrateError(_) => "MIGRATION_ERROR",
            Error::JWTError(_) => "INVALID_TOKEN",
            Error::ValidationError(_) | Error::InvalidInput(_) => "VALIDATION_ERROR",
            Error::BusinessError(_) => "BUSINESS_ERROR",
            Error::NotFound(_) => "NOT_FOUND",
            Error::Unauthorized => "UNAUTHORIZED",
            Error::Forbidden(_) => "FORBIDDEN",
            Error::Conflict(_) => "CONFLICT",
            Error::ConfigError(_) => "CONFIG_ERROR",
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        match self {
            Error::ValidationError(_) | Error::InvalidInput(_) | Error::BusinessError(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized | Error::JWTError(_) => StatusCode::UNAUTHORIZED,
            Error::Forbidden(_) => StatusCode::FORBIDDEN,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::DatabaseError(_) | Error::MigrateError(_) | Error::ConfigError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        } else {
            log::debug!("request rejected: {}", self);
        }
        // internals of 5xx errors stay in the log
        let message = if status.is_server_error() { "internal server error".to_owned() } else { self.to_string() };
        HttpResponse::build(status).json(ErrorBody { error: self.code(), message })
    }
}
