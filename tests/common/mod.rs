#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response, header},
};
use http_body_util::BodyExt; // for .collect()
use parking_lot::Mutex;

use blog_backend::{
    AppState,
    config::Config,
    database::DbSlot,
    error::SessionError,
    routes::{Mounts, create_app},
    session::{MemoryStore, SessionManager, SessionRecord, SessionStore},
};

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "MONGO_USER" => Some("root".to_string()),
        "MONGO_PASSWORD" => Some("example".to_string()),
        "SESSION_SECRET" => Some("keyboard cat".to_string()),
        _ => None,
    })
    .unwrap()
}

pub fn build_app(
    config: Config,
    store: Arc<dyn SessionStore>,
    db: DbSlot<mongodb::Client>,
    mounts: Mounts,
) -> Router {
    let sessions = SessionManager::new(store, config.session_config());
    create_app(AppState { config, db }, sessions, mounts)
}

/// 数据库从未连接，使用默认挂载
pub fn default_app(store: Arc<dyn SessionStore>) -> Router {
    build_app(test_config(), store, DbSlot::new(), Mounts::default())
}

pub async fn connected_db() -> DbSlot<mongodb::Client> {
    // 客户端惰性连接，这里不会访问网络
    let client = mongodb::Client::with_uri_str("mongodb://localhost:27017")
        .await
        .unwrap();
    DbSlot::ready(client)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn get_with_cookie(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// 完整的 Set-Cookie 头
pub fn set_cookie_header(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .map(|value| value.to_str().unwrap().to_string())
}

/// 可以直接放进 Cookie 头的 `name=value` 部分
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    set_cookie_header(response).map(|value| value.split(';').next().unwrap().to_string())
}

/// 统计写入次数的存储
#[derive(Default)]
pub struct CountingStore {
    inner: MemoryStore,
    sets: AtomicUsize,
    touches: AtomicUsize,
    destroys: AtomicUsize,
    last_saved: Mutex<Option<SessionRecord>>,
}

impl CountingStore {
    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn touches(&self) -> usize {
        self.touches.load(Ordering::SeqCst)
    }

    pub fn destroys(&self) -> usize {
        self.destroys.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> usize {
        self.inner.len()
    }

    pub fn last_saved(&self) -> Option<SessionRecord> {
        self.last_saved.lock().clone()
    }
}

#[async_trait]
impl SessionStore for CountingStore {
    async fn get(&self, sid: &str) -> Result<Option<SessionRecord>, SessionError> {
        self.inner.get(sid).await
    }

    async fn set(&self, sid: &str, record: &SessionRecord) -> Result<(), SessionError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        *self.last_saved.lock() = Some(record.clone());
        self.inner.set(sid, record).await
    }

    async fn touch(&self, sid: &str, record: &SessionRecord) -> Result<(), SessionError> {
        self.touches.fetch_add(1, Ordering::SeqCst);
        self.inner.touch(sid, record).await
    }

    async fn destroy(&self, sid: &str) -> Result<(), SessionError> {
        self.destroys.fetch_add(1, Ordering::SeqCst);
        self.inner.destroy(sid).await
    }
}

/// 模拟 Redis 不可用
#[derive(Default)]
pub struct UnreachableStore {
    pub calls: AtomicUsize,
}

impl UnreachableStore {
    fn refused(&self) -> SessionError {
        self.calls.fetch_add(1, Ordering::SeqCst);
        redis::RedisError::from((redis::ErrorKind::IoError, "connection refused")).into()
    }
}

#[async_trait]
impl SessionStore for UnreachableStore {
    async fn get(&self, _sid: &str) -> Result<Option<SessionRecord>, SessionError> {
        Err(self.refused())
    }

    async fn set(&self, _sid: &str, _record: &SessionRecord) -> Result<(), SessionError> {
        Err(self.refused())
    }

    async fn touch(&self, _sid: &str, _record: &SessionRecord) -> Result<(), SessionError> {
        Err(self.refused())
    }

    async fn destroy(&self, _sid: &str) -> Result<(), SessionError> {
        Err(self.refused())
    }
}

/// 按 Redis 语义工作的存储：touch 只延长键的 TTL，保存的 JSON 不变，
/// 读取时也不看记录里的 `cookie.expires`
#[derive(Default)]
pub struct RedisLikeStore {
    values: Mutex<HashMap<String, String>>,
    pub touches: AtomicUsize,
}

impl RedisLikeStore {
    /// 把记录里的 expires 改到过去，键本身仍然存活（之前的 touch 延长过 TTL）
    pub fn age_stored_records(&self) {
        let past = chrono::Utc::now() - chrono::Duration::minutes(5);
        for json in self.values.lock().values_mut() {
            let mut record: SessionRecord = serde_json::from_str(json).unwrap();
            record.cookie.expires = Some(past);
            *json = serde_json::to_string(&record).unwrap();
        }
    }
}

#[async_trait]
impl SessionStore for RedisLikeStore {
    async fn get(&self, sid: &str) -> Result<Option<SessionRecord>, SessionError> {
        match self.values.lock().get(sid) {
            Some(json) => Ok(Some(serde_json::from_str(json)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, sid: &str, record: &SessionRecord) -> Result<(), SessionError> {
        let json = serde_json::to_string(record)?;
        self.values.lock().insert(sid.to_string(), json);
        Ok(())
    }

    async fn touch(&self, _sid: &str, _record: &SessionRecord) -> Result<(), SessionError> {
        self.touches.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn destroy(&self, sid: &str) -> Result<(), SessionError> {
        self.values.lock().remove(sid);
        Ok(())
    }
}

/// 存储里的记录无法解析，写入正常
#[derive(Default)]
pub struct CorruptStore {
    pub sets: AtomicUsize,
}

#[async_trait]
impl SessionStore for CorruptStore {
    async fn get(&self, _sid: &str) -> Result<Option<SessionRecord>, SessionError> {
        Err(serde_json::from_str::<SessionRecord>("not json")
            .unwrap_err()
            .into())
    }

    async fn set(&self, _sid: &str, _record: &SessionRecord) -> Result<(), SessionError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn touch(&self, _sid: &str, _record: &SessionRecord) -> Result<(), SessionError> {
        Ok(())
    }

    async fn destroy(&self, _sid: &str) -> Result<(), SessionError> {
        Ok(())
    }
}
