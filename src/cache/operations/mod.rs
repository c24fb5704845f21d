/// 缓存操作
/// 提供缓存操作的功能实现

// 连接探测
pub mod connection;

// 会话存储
pub mod session;

// 重新导出常用操作
pub use connection::report_connection;
pub use session::RedisSessionStore;
