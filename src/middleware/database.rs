use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{AppState, error::AppError};

/// 数据库尚未连接时直接返回 503
pub async fn require_database(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    if !state.db.is_ready() {
        return Err(AppError::DatabaseUnavailable);
    }
    Ok(next.run(req).await)
}
