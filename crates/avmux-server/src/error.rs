use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use avmux_media::MergeError;
use avmux_protocol::{FailureResponse, MissingFieldsResponse};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            Self::Merge(e) if e.is_client_error() => (
                StatusCode::BAD_REQUEST,
                Json(MissingFieldsResponse::new(e.summary())),
            )
                .into_response(),
            Self::InvalidBody(_) => (
                StatusCode::BAD_REQUEST,
                Json(MissingFieldsResponse::new("Invalid JSON body")),
            )
                .into_response(),
            Self::Merge(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(FailureResponse::new(e.summary(), e.details())),
            )
                .into_response(),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(FailureResponse::new("Internal server error", other.to_string())),
            )
                .into_response(),
        }
    }
}
