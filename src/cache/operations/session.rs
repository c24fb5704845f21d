use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, Client as RedisClient};

use crate::cache::keys::session_key;
use crate::error::SessionError;
use crate::session::{SessionRecord, SessionStore};

/// 写入会话时对应的 Redis 命令
#[derive(Debug, PartialEq)]
enum SessionWrite {
    /// SETEX key ttl json
    Store { json: String, ttl: u64 },
    /// TTL 已耗尽，直接 DEL
    Delete,
}

fn prepare_write(record: &SessionRecord, now: DateTime<Utc>) -> Result<SessionWrite, SessionError> {
    let ttl = record.ttl_secs(now);
    if ttl <= 0 {
        return Ok(SessionWrite::Delete);
    }
    Ok(SessionWrite::Store {
        json: serde_json::to_string(record)?,
        ttl: ttl as u64,
    })
}

fn decode_record(value: Option<String>) -> Result<Option<SessionRecord>, SessionError> {
    match value {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

/// Redis 会话存储
///
/// 记录以 JSON 形式保存在 `sess:<id>` 下，TTL 取自 `cookie.expires`。
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: Arc<RedisClient>,
}

impl RedisSessionStore {
    pub fn new(redis: Arc<RedisClient>) -> Self {
        Self { redis }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    /// 获取会话
    async fn get(&self, sid: &str) -> Result<Option<SessionRecord>, SessionError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let result: Option<String> = conn.get(session_key(sid)).await?;

        decode_record(result)
    }

    /// 缓存会话
    async fn set(&self, sid: &str, record: &SessionRecord) -> Result<(), SessionError> {
        let write = prepare_write(record, Utc::now())?;
        let mut conn = self.redis.get_multiplexed_async_connection().await?;
        let key = session_key(sid);

        match write {
            SessionWrite::Store { json, ttl } => {
                let _: () = conn.set_ex(key, json, ttl).await?;
            }
            SessionWrite::Delete => {
                let _: () = conn.del(key).await?;
            }
        }

        Ok(())
    }

    /// 刷新会话过期时间
    async fn touch(&self, sid: &str, record: &SessionRecord) -> Result<(), SessionError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let _: () = conn.expire(session_key(sid), record.ttl_secs(Utc::now())).await?;

        Ok(())
    }

    /// 删除会话
    async fn destroy(&self, sid: &str) -> Result<(), SessionError> {
        let mut conn = self.redis.get_multiplexed_async_connection().await?;

        let _: () = conn.del(session_key(sid)).await?;

        Ok(())
    }
}
