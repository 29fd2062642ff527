use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Bad request: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND.into_response(),
            AppError::Unauthorized => StatusCode::UNAUTHORIZED.into_response(),
            AppError::Validation(msg) => error_body(StatusCode::BAD_REQUEST, &msg),
            AppError::Forbidden(msg) => error_body(StatusCode::FORBIDDEN, &msg),
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Server Error")
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Server Error")
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Server Error")
            }
        }
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error_message": message }))).into_response()
}

pub type AppResult<T> = Result<T, AppError>;
