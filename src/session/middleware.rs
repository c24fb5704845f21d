use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{FromRequestParts, State},
    http::{Request, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::cookie::{decode_session_id, encode_session_id};
use super::record::SessionRecord;
use super::store::SessionStore;
use crate::error::{AppError, SessionError};
use crate::middleware::ClientInfo;

/// 会话 cookie 属性
#[derive(Debug, Clone)]
pub struct CookieOptions {
    pub name: String,
    pub path: String,
    /// 只通过 HTTPS 发送
    pub secure: bool,
    /// 客户端脚本不可读
    pub http_only: bool,
    pub max_age: Duration,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            name: "connect.sid".to_string(),
            path: "/".to_string(),
            secure: false,
            http_only: true,
            max_age: Duration::from_millis(60_000),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub secret: String,
    /// 未修改的会话是否也重新写入
    pub resave: bool,
    /// 从未写入数据的新会话是否保存
    pub save_uninitialized: bool,
    /// 每次响应都重新下发 cookie
    pub rolling: bool,
    pub cookie: CookieOptions,
}

impl SessionConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            resave: false,
            save_uninitialized: false,
            rolling: false,
            cookie: CookieOptions::default(),
        }
    }
}

#[derive(Debug)]
struct SessionState {
    id: String,
    record: SessionRecord,
    original: Map<String, Value>,
    is_new: bool,
    destroyed: bool,
    // 存储不可用时加载的会话，不保存也不下发 cookie
    detached: bool,
}

/// 请求期间的会话句柄，可在 handler 中通过提取器获得
#[derive(Debug, Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionState>>,
}

struct Snapshot {
    id: String,
    record: SessionRecord,
    is_new: bool,
    destroyed: bool,
    detached: bool,
    modified: bool,
}

impl Session {
    fn from_state(id: String, record: SessionRecord, is_new: bool, detached: bool) -> Self {
        let original = record.data.clone();
        Self {
            inner: Arc::new(Mutex::new(SessionState {
                id,
                record,
                original,
                is_new,
                destroyed: false,
                detached,
            })),
        }
    }

    pub fn id(&self) -> String {
        self.inner.lock().id.clone()
    }

    pub fn is_new(&self) -> bool {
        self.inner.lock().is_new
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.inner.lock().record.data.get(key).cloned()?;
        serde_json::from_value(value).ok()
    }

    pub fn insert<T: Serialize>(&self, key: &str, value: T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value)?;
        self.inner.lock().record.data.insert(key.to_string(), value);
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.lock().record.data.remove(key)
    }

    pub fn clear(&self) {
        self.inner.lock().record.data.clear();
    }

    /// 请求结束时从存储中删除，并让客户端清除 cookie
    pub fn destroy(&self) {
        let mut state = self.inner.lock();
        state.destroyed = true;
        state.record.data.clear();
    }

    pub fn is_modified(&self) -> bool {
        let state = self.inner.lock();
        state.record.data != state.original
    }

    fn snapshot(&self, now: DateTime<Utc>) -> Snapshot {
        let mut state = self.inner.lock();
        state.record.reset_expiry(now);
        Snapshot {
            id: state.id.clone(),
            record: state.record.clone(),
            is_new: state.is_new,
            destroyed: state.destroyed,
            detached: state.detached,
            modified: state.record.data != state.original,
        }
    }
}

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AppError::SessionLayerMissing)
    }
}

enum CookieAction {
    Keep,
    Issue(String),
    Remove,
}

/// 会话中间件的共享状态
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    config: Arc<SessionConfig>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    async fn load(&self, cookie_id: Option<String>) -> Session {
        let now = Utc::now();
        if let Some(sid) = cookie_id {
            // 过期由存储负责（Redis TTL），touch 不会改写记录里的 cookie.expires
            match self.store.get(&sid).await {
                Ok(Some(record)) => {
                    return Session::from_state(sid, record, false, false);
                }
                Ok(None) => debug!("Session not found or expired, issuing a new one"),
                Err(SessionError::Serialization(e)) => {
                    warn!("Discarding unreadable session record: {}", e);
                }
                Err(e) => {
                    error!("Failed to load session from store: {}", e);
                    let record = SessionRecord::new(&self.config.cookie, now);
                    return Session::from_state(sid, record, false, true);
                }
            }
        }
        let sid = Uuid::new_v4().simple().to_string();
        Session::from_state(sid, SessionRecord::new(&self.config.cookie, now), true, false)
    }

    async fn commit(&self, session: &Session) -> CookieAction {
        let snapshot = session.snapshot(Utc::now());
        if snapshot.detached {
            return CookieAction::Keep;
        }

        if snapshot.destroyed {
            if snapshot.is_new {
                return CookieAction::Keep;
            }
            if let Err(e) = self.store.destroy(&snapshot.id).await {
                error!("Failed to destroy session: {}", e);
            }
            return CookieAction::Remove;
        }

        let should_save = snapshot.modified
            || if snapshot.is_new {
                self.config.save_uninitialized
            } else {
                self.config.resave
            };

        let mut saved = false;
        if should_save {
            match self.store.set(&snapshot.id, &snapshot.record).await {
                Ok(()) => saved = true,
                Err(e) => error!("Failed to save session: {}", e),
            }
        } else if !snapshot.is_new {
            if let Err(e) = self.store.touch(&snapshot.id, &snapshot.record).await {
                error!("Failed to touch session: {}", e);
            }
        }

        let issue = if snapshot.is_new {
            saved
        } else {
            snapshot.modified || self.config.rolling
        };
        if issue {
            CookieAction::Issue(snapshot.id)
        } else {
            CookieAction::Keep
        }
    }

    fn build_cookie(&self, sid: &str) -> Cookie<'static> {
        let options = &self.config.cookie;
        Cookie::build((
            options.name.clone(),
            encode_session_id(sid, &self.config.secret),
        ))
        .path(options.path.clone())
        .http_only(options.http_only)
        .secure(options.secure)
        .max_age(time::Duration::try_from(options.max_age).unwrap_or(time::Duration::MAX))
        .build()
    }

    fn removal_cookie(&self) -> Cookie<'static> {
        let options = &self.config.cookie;
        Cookie::build((options.name.clone(), ""))
            .path(options.path.clone())
            .build()
    }
}

/// 加载会话并挂到请求上，handler 返回后按配置持久化
pub async fn session_middleware(
    State(manager): State<SessionManager>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let cookie_id = jar
        .get(&manager.config.cookie.name)
        .and_then(|cookie| decode_session_id(cookie.value(), &manager.config.secret));
    let https = req
        .extensions()
        .get::<ClientInfo>()
        .is_some_and(ClientInfo::is_https);

    let session = manager.load(cookie_id).await;
    req.extensions_mut().insert(session.clone());

    let response = next.run(req).await;

    match manager.commit(&session).await {
        CookieAction::Keep => response,
        CookieAction::Issue(sid) => {
            if manager.config.cookie.secure && !https {
                warn!("Not sending secure session cookie over an insecure connection");
                return response;
            }
            (jar.add(manager.build_cookie(&sid)), response).into_response()
        }
        CookieAction::Remove => (jar.remove(manager.removal_cookie()), response).into_response(),
    }
}
