// 数据库模块
// 连接器抽象、重连任务和 MongoDB 实现

pub mod connector; // 连接器与重连策略
pub mod mongo; // MongoDB 连接器

// 重新导出常用类型和函数，方便其他模块使用
pub use connector::{Connector, DbSlot, RetryPolicy, connect_with_retry, spawn_reconnect};
pub use mongo::MongoConnector;
