/// 会话缓存键前缀，与 connect-redis 一致
pub const SESSION_PREFIX: &str = "sess:";

/// 生成会话缓存键
pub fn session_key(session_id: &str) -> String {
    format!("{}{}", SESSION_PREFIX, session_id)
}
