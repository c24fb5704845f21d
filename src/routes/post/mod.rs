mod handler;

use axum::{Router, routing::any};

use crate::AppState;

/// 文章路由挂载点，具体接口由外部路由实现
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", any(handler::not_mounted))
        .route("/{*rest}", any(handler::not_mounted))
}
