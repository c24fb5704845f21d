use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::CookieOptions;

/// 没有过期时间的会话在存储中保留一天
pub const DEFAULT_TTL_SECS: i64 = 86_400;

/// 随会话持久化的 cookie 信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieMeta {
    pub original_max_age: Option<u64>,
    pub expires: Option<DateTime<Utc>>,
    pub secure: bool,
    pub http_only: bool,
    pub path: String,
}

/// 会话记录，用户数据与 `cookie` 字段平铺在同一个 JSON 对象中
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub cookie: CookieMeta,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl SessionRecord {
    pub fn new(options: &CookieOptions, now: DateTime<Utc>) -> Self {
        let max_age_ms = u64::try_from(options.max_age.as_millis()).unwrap_or(u64::MAX);
        let mut record = Self {
            cookie: CookieMeta {
                original_max_age: Some(max_age_ms),
                expires: None,
                secure: options.secure,
                http_only: options.http_only,
                path: options.path.clone(),
            },
            data: Map::new(),
        };
        record.reset_expiry(now);
        record
    }

    /// expires = now + originalMaxAge，超出时间范围时视为不过期
    pub fn reset_expiry(&mut self, now: DateTime<Utc>) {
        self.cookie.expires = self.cookie.original_max_age.and_then(|ms| {
            let ms = i64::try_from(ms).ok()?;
            now.checked_add_signed(chrono::Duration::try_milliseconds(ms)?)
        });
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.cookie.expires.is_some_and(|expires| expires <= now)
    }

    /// 存储 TTL（秒，向上取整），已过期时 <= 0
    pub fn ttl_secs(&self, now: DateTime<Utc>) -> i64 {
        match self.cookie.expires {
            Some(expires) => {
                let ms = (expires - now).num_milliseconds();
                if ms <= 0 { 0 } else { (ms + 999) / 1000 }
            }
            None => DEFAULT_TTL_SECS,
        }
    }
}
