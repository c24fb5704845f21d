// 会话模块
// 签名 cookie、会话记录、存储抽象和中间件

pub mod cookie;
pub mod middleware;
pub mod record;
pub mod store;

pub use middleware::{CookieOptions, Session, SessionConfig, SessionManager, session_middleware};
pub use record::{CookieMeta, SessionRecord};
pub use store::{MemoryStore, SessionStore};
