use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use super::record::SessionRecord;
use crate::error::SessionError;

/// 会话持久化后端
///
/// 过期时间取自 `record.cookie.expires`，TTL 已耗尽的记录直接删除。
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// 不存在或已过期时返回 `Ok(None)`
    async fn get(&self, sid: &str) -> Result<Option<SessionRecord>, SessionError>;

    async fn set(&self, sid: &str, record: &SessionRecord) -> Result<(), SessionError>;

    /// 只刷新过期时间，不改写数据
    async fn touch(&self, sid: &str, record: &SessionRecord) -> Result<(), SessionError>;

    async fn destroy(&self, sid: &str) -> Result<(), SessionError>;
}

/// 进程内存储，用于测试和本地开发
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<HashMap<String, SessionRecord>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn get(&self, sid: &str) -> Result<Option<SessionRecord>, SessionError> {
        let mut sessions = self.inner.lock();
        let expired = match sessions.get(sid) {
            Some(record) => record.is_expired(Utc::now()),
            None => return Ok(None),
        };
        if expired {
            sessions.remove(sid);
            return Ok(None);
        }
        Ok(sessions.get(sid).cloned())
    }

    async fn set(&self, sid: &str, record: &SessionRecord) -> Result<(), SessionError> {
        let now = Utc::now();
        let mut sessions = self.inner.lock();
        // 顺带清理已过期但从未再被读取的记录
        sessions.retain(|_, stored| !stored.is_expired(now));
        if record.ttl_secs(now) <= 0 {
            sessions.remove(sid);
        } else {
            sessions.insert(sid.to_string(), record.clone());
        }
        Ok(())
    }

    async fn touch(&self, sid: &str, record: &SessionRecord) -> Result<(), SessionError> {
        if let Some(stored) = self.inner.lock().get_mut(sid) {
            stored.cookie.expires = record.cookie.expires;
        }
        Ok(())
    }

    async fn destroy(&self, sid: &str) -> Result<(), SessionError> {
        self.inner.lock().remove(sid);
        Ok(())
    }
}
