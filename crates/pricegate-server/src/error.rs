use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pricegate_core::{SourceError, SourceErrorKind, ValidationError};
use thiserror::Error;

use crate::models::DetailBody;

/// Errors surfaced as HTTP statuses with a `{detail}` body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    BadGateway(String),
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::BadGateway(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        Self::BadRequest(error.to_string())
    }
}

impl From<SourceError> for ApiError {
    fn from(error: SourceError) -> Self {
        match error.kind() {
            SourceErrorKind::DomainNotAllowed => Self::BadRequest(error.message().to_owned()),
            _ => Self::BadGateway(error.message().to_owned()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = DetailBody {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Startup failures.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ValidationError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
