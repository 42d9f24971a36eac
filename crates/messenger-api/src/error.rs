use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use messenger_types::api::{ErrorBody, MessageRecord, PartialFanoutBody};

/// Everything a handler can fail with. Input problems map to 4xx before the
/// store is touched; store problems map to 500 and are never retried.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),

    #[error("Message {} stored but {} conversation index write(s) failed", .message.message_id, .failed_user_ids.len())]
    PartialFanout {
        message: MessageRecord,
        failed_user_ids: Vec<Uuid>,
    },

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Rejected { status, .. } => *status,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(_) | ApiError::PartialFanout { .. } | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Rejected { .. } | ApiError::Validation(_) => "INVALID_INPUT",
            ApiError::Store(_) => "STORE_ERROR",
            ApiError::PartialFanout { .. } => "PARTIAL_FANOUT",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code().to_string();
        let text = self.to_string();

        match self {
            ApiError::PartialFanout { message, failed_user_ids } => (
                status,
                Json(PartialFanoutBody {
                    error: text,
                    code,
                    message,
                    failed_user_ids,
                }),
            )
                .into_response(),
            other => {
                if status.is_server_error() {
                    error!("{}", other);
                }
                (status, Json(ErrorBody { error: text, code })).into_response()
            }
        }
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Rejected {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}
