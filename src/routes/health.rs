use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

use crate::{AppState, utils::success_to_api_response};

#[derive(Serialize)]
pub struct HealthResponse {
    /// 服务状态
    pub status: String,
    /// connected / connecting
    pub database: String,
    /// 服务器时间
    pub timestamp: i64,
}

/// 健康检查接口，数据库未连接时也返回 200
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let database = if state.db.is_ready() {
        "connected"
    } else {
        "connecting"
    };

    (
        StatusCode::OK,
        success_to_api_response(HealthResponse {
            status: "ok".to_string(),
            database: database.to_string(),
            timestamp: chrono::Utc::now().timestamp(),
        }),
    )
}
