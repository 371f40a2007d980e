use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::{ingest::VIDEO_FIELD, models::ErrorResponse};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("video id {0} is already taken")]
    Conflict(String),

    #[error("video store is full ({limit} videos)")]
    CapacityExhausted { limit: usize },
}

#[derive(Debug, Error)]
pub enum IngestError {
    /// Missing or empty form input. Nothing was written.
    #[error("{0}")]
    Validation(String),

    #[error("Upload too large. Maximum size is {}", format_size(.limit))]
    TooLarge { limit: u64 },

    #[error("Error parsing form: {0}")]
    Multipart(#[source] multer::Error),

    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("Error saving video: {0}")]
    Store(#[from] StoreError),
}

impl IngestError {
    pub fn io(context: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| Self::Io { context, source }
    }

    pub fn background(err: tokio::task::JoinError) -> Self {
        Self::Io {
            context: "Background file task failed",
            source: std::io::Error::other(err),
        }
    }
}

impl From<multer::Error> for IngestError {
    fn from(err: multer::Error) -> Self {
        match err {
            multer::Error::FieldSizeExceeded {
                field_name: Some(name),
                ..
            } if name != VIDEO_FIELD => Self::Validation(format!("{name} is too long")),
            multer::Error::FieldSizeExceeded { limit, .. }
            | multer::Error::StreamSizeExceeded { limit } => Self::TooLarge { limit },
            other => Self::Multipart(other),
        }
    }
}

fn format_size(bytes: &u64) -> String {
    const MB: u64 = 1024 * 1024;
    if *bytes >= MB && bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else if *bytes >= MB {
        format!("{:.1}MB", *bytes as f64 / MB as f64)
    } else {
        format!("{bytes} bytes")
    }
}

/// Error rendered at the HTTP boundary as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<IngestError> for ApiError {
    fn from(err: IngestError) -> Self {
        let status = match &err {
            IngestError::Validation(_) | IngestError::Multipart(_) => StatusCode::BAD_REQUEST,
            IngestError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            IngestError::Io { .. } | IngestError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            error!("{} {}", self.status, self.message);
        }
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
