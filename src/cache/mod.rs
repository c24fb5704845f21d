// 缓存模块
// Redis 连接探测与会话存储

pub mod keys;
pub mod operations;

// 重新导出常用类型和函数，方便其他模块使用
pub use operations::connection::report_connection;
pub use operations::session::RedisSessionStore;
