pub mod demo;
pub mod health;
pub mod post;
pub mod user;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer};

use crate::{
    AppState,
    middleware::{TrustProxy, log_errors, require_database, trust_proxy},
    session::{SessionManager, session_middleware},
};

/// JSON 请求体上限（100kb）
pub const JSON_BODY_LIMIT: usize = 100 * 1024;

/// 挂载到 `/api/v1` 下的外部路由
pub struct Mounts {
    pub posts: Router<AppState>,
    pub users: Router<AppState>,
}

impl Default for Mounts {
    fn default() -> Self {
        Self {
            posts: post::router(),
            users: user::router(),
        }
    }
}

/// 创建应用路由
///
/// 请求依次经过 CORS、错误日志、代理解析、会话、请求体限制，最后分发到路由。
pub fn create_app(state: AppState, sessions: SessionManager, mounts: Mounts) -> Router {
    // 需要数据库的路由，连接建立前返回 503
    let api = Router::new()
        .nest("/api/v1/posts", mounts.posts)
        .nest("/api/v1/users", mounts.users)
        .layer(from_fn_with_state(state.clone(), require_database));

    let mut router = Router::new()
        .route("/health", get(health::health))
        .merge(api);

    if state.config.demo_routes {
        router = router
            .route("/", get(demo::root))
            .route("/test", get(demo::test));
    }

    // 最后添加的 layer 最先处理请求
    router
        .layer(RequestBodyLimitLayer::new(JSON_BODY_LIMIT))
        .layer(from_fn_with_state(sessions, session_middleware))
        .layer(from_fn_with_state(
            TrustProxy(state.config.trust_proxy),
            trust_proxy,
        ))
        .layer(from_fn(log_errors))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
