use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use memo_core::error::{LedgerError, SessionError, ValidationFailure};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Pre-submission validation failures, reported individually and
    /// field-scoped. Blocks before any network call.
    #[error("memo failed validation")]
    Validation(Vec<ValidationFailure>),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    /// The farm API rejected or failed a call. The message is the server's
    /// own when it provided one.
    #[error("{0}")]
    Upstream(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Validation(failures) => AppError::Validation(failures),
            SessionError::Ledger(LedgerError::UnknownLine { .. }) => {
                AppError::NotFound(anyhow::anyhow!("{err}"))
            }
            SessionError::Ledger(LedgerError::DuplicateLine { .. }) => {
                AppError::Conflict(anyhow::anyhow!("{err}"))
            }
            SessionError::NotEditable { .. } | SessionError::SubmitInFlight => {
                AppError::Conflict(anyhow::anyhow!("{err}"))
            }
            SessionError::MethodNotSet
            | SessionError::UnknownAccount { .. }
            | SessionError::AccountMethodMismatch { .. } => {
                AppError::BadRequest(anyhow::anyhow!("{err}"))
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            failures: Option<Vec<ValidationFailure>>,
        }

        let (status, error_message, failures) = match self {
            AppError::Validation(failures) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "memo failed validation".to_string(),
                Some(failures),
            ),
            AppError::BadRequest(err) => (StatusCode::BAD_REQUEST, err.to_string(), None),
            AppError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string(), None),
            AppError::Conflict(err) => (StatusCode::CONFLICT, err.to_string(), None),
            AppError::Upstream(message) => (StatusCode::BAD_GATEWAY, message, None),
            AppError::Internal(err) => {
                tracing::error!("Internal error: {:#}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                    None,
                )
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: error_message,
                failures,
            }),
        )
            .into_response()
    }
}
