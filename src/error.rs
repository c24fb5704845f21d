use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::utils::{error_codes, error_to_api_response};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("database is not connected yet")]
    DatabaseUnavailable,
    #[error("session layer is not installed")]
    SessionLayerMissing,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("{0} is not implemented")]
    NotImplemented(&'static str),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session store error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::DatabaseUnavailable => {
                (StatusCode::SERVICE_UNAVAILABLE, error_codes::DATABASE_UNAVAILABLE)
            }
            AppError::SessionLayerMissing | AppError::Session(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, error_codes::INTERNAL_ERROR)
            }
            AppError::NotImplemented(_) => {
                (StatusCode::NOT_IMPLEMENTED, error_codes::NOT_IMPLEMENTED)
            }
        };

        (status, error_to_api_response::<()>(code, self.to_string())).into_response()
    }
}
