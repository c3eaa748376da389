use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use polars::prelude::PolarsError;
use thiserror::Error;

use crate::views::page::{self, PageView};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Could not parse the uploaded file as CSV: {0}")]
    ParseFailure(String),

    #[error("Upload rejected: {0}")]
    UploadRejected(String),

    #[error("Upload exceeds the {limit_mb}MB limit")]
    PayloadTooLarge { limit_mb: usize },

    #[error("Rendering error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DataFrame error: {0}")]
    DataFrame(#[from] PolarsError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Message shown on the upload page when the failure is the user's file.
    /// Run failures return `None` and are reported as a generic error.
    pub fn user_warning(&self) -> Option<String> {
        match self {
            AppError::UnsupportedFileType(_)
            | AppError::ParseFailure(_)
            | AppError::UploadRejected(_)
            | AppError::PayloadTooLarge { .. } => Some(self.to_string()),
            AppError::DataFrame(e) => Some(format!("Could not parse the uploaded file as CSV: {}", e)),
            _ => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UnsupportedFileType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::ParseFailure(_) | AppError::UploadRejected(_) | AppError::DataFrame(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Render(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Report task failed: {}", err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self.user_warning() {
            Some(warning) => {
                tracing::warn!("Rejected upload: {}", warning);
                page::render(&PageView::NoFile { warning: Some(warning) })
            }
            None => {
                tracing::error!("Report run failed: {}", self);
                page::render_error()
            }
        };

        (status, Html(body)).into_response()
    }
}
