use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum StudyError {
    #[error("unknown account")]
    Unauthorized,

    #[error("login required")]
    Forbidden,

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<figment::Error> for StudyError {
    fn from(e: figment::Error) -> Self {
        StudyError::Config(e.to_string())
    }
}

impl IntoResponse for StudyError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_body) = match self {
            StudyError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ApiErrorBody {
                    code: "UNAUTHORIZED".to_string(),
                    message: "Unknown account.".to_string(),
                },
            ),
            StudyError::Forbidden => (
                StatusCode::FORBIDDEN,
                ApiErrorBody {
                    code: "FORBIDDEN".to_string(),
                    message: "Login required.".to_string(),
                },
            ),
            StudyError::BadRequest(reason) => (
                StatusCode::BAD_REQUEST,
                ApiErrorBody {
                    code: "BAD_REQUEST".to_string(),
                    message: reason,
                },
            ),
            // Store failures surface the driver message so the caller can see what broke.
            StudyError::DatabaseError(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorBody {
                    code: "STORE_FAILURE".to_string(),
                    message: e.to_string(),
                },
            ),
            StudyError::JsonError(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: e.to_string(),
                },
            ),
            StudyError::Config(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: msg,
                },
            ),
        };
        (status, Json(ApiErrorResponse { error: error_body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
