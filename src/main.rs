use std::net::SocketAddr;
use std::sync::Arc;

use blog_backend::{
    AppState,
    cache::{RedisSessionStore, report_connection},
    config::Config,
    database::{DbSlot, MongoConnector, spawn_reconnect},
    routes::{Mounts, create_app},
    session::SessionManager,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().expect("Failed to load configuration");

    // 数据库在后台连接，失败时按固定间隔重试，不阻塞服务启动
    let db = DbSlot::new();
    spawn_reconnect(
        MongoConnector::new(config.mongo_url()),
        config.retry_policy(),
        db.clone(),
    );

    // 设置 Redis 客户端
    let redis_client =
        redis::Client::open(config.redis_url()).expect("Failed to create Redis client");
    let redis_arc = Arc::new(redis_client);
    tokio::spawn(report_connection(redis_arc.clone()));

    // 会话存储
    let sessions = SessionManager::new(
        Arc::new(RedisSessionStore::new(redis_arc)),
        config.session_config(),
    );

    // 设置应用状态
    let addr = config.listen_addr();
    let state = AppState { config, db };
    let app = create_app(state, sessions, Mounts::default());

    // 启动服务器
    tracing::info!("Listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}
