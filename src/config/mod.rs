use std::env;
use std::net::{IpAddr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use crate::database::RetryPolicy;
use crate::session::{CookieOptions, SessionConfig};

/// 会话有效期上限（十年），超出的值在启动时拒绝
pub const MAX_SESSION_MAX_AGE_MS: u64 = 10 * 365 * 24 * 60 * 60 * 1000;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub mongo_user: String,
    pub mongo_password: String,
    pub mongo_ip: String,
    pub mongo_port: u16,
    pub redis_host: String,
    pub redis_port: u16,
    pub session_secret: String,
    pub session_max_age_ms: u64,
    pub session_cookie_secure: bool,
    pub session_resave: bool,
    pub session_save_uninitialized: bool,
    pub session_rolling: bool,
    pub server_host: String,
    pub server_port: u16,
    pub trust_proxy: bool,
    pub db_retry_delay_ms: u64,
    pub demo_routes: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意键值来源读取配置，`from_env` 使用进程环境变量
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| lookup(var).ok_or(ConfigError::Missing(var));
        let or_default = |var: &'static str, default: &str| {
            lookup(var).unwrap_or_else(|| default.to_string())
        };

        let session_max_age_ms = parse_or(&lookup, "SESSION_MAX_AGE_MS", 60_000)?;
        if session_max_age_ms > MAX_SESSION_MAX_AGE_MS {
            return Err(ConfigError::Invalid {
                var: "SESSION_MAX_AGE_MS",
                value: session_max_age_ms.to_string(),
            });
        }

        Ok(Config {
            mongo_user: required("MONGO_USER")?,
            mongo_password: required("MONGO_PASSWORD")?,
            mongo_ip: or_default("MONGO_IP", "mongo"),
            mongo_port: parse_or(&lookup, "MONGO_PORT", 27017)?,
            redis_host: or_default("REDIS_HOST", "redis"),
            redis_port: parse_or(&lookup, "REDIS_PORT", 6379)?,
            session_secret: required("SESSION_SECRET")?,
            session_max_age_ms,
            session_cookie_secure: parse_or(&lookup, "SESSION_COOKIE_SECURE", false)?,
            session_resave: parse_or(&lookup, "SESSION_RESAVE", false)?,
            session_save_uninitialized: parse_or(&lookup, "SESSION_SAVE_UNINITIALIZED", false)?,
            session_rolling: parse_or(&lookup, "SESSION_ROLLING", false)?,
            server_host: or_default("SERVER_HOST", "0.0.0.0"),
            server_port: parse_or(&lookup, "PORT", 3000)?,
            trust_proxy: parse_or(&lookup, "TRUST_PROXY", true)?,
            db_retry_delay_ms: parse_or(&lookup, "DB_RETRY_DELAY_MS", 5000)?,
            demo_routes: parse_or(&lookup, "DEMO_ROUTES", true)?,
        })
    }

    pub fn mongo_url(&self) -> String {
        format!(
            "mongodb://{}:{}@{}:{}/?authSource=admin",
            self.mongo_user, self.mongo_password, self.mongo_ip, self.mongo_port
        )
    }

    pub fn redis_url(&self) -> String {
        format!("redis://{}:{}", self.redis_host, self.redis_port)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::fixed(Duration::from_millis(self.db_retry_delay_ms))
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            secret: self.session_secret.clone(),
            resave: self.session_resave,
            save_uninitialized: self.session_save_uninitialized,
            rolling: self.session_rolling,
            cookie: CookieOptions {
                secure: self.session_cookie_secure,
                max_age: Duration::from_millis(self.session_max_age_ms),
                ..CookieOptions::default()
            },
        }
    }

    pub fn listen_addr(&self) -> SocketAddr {
        let ip = self.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(Ipv6Addr::UNSPECIFIED)
        });
        SocketAddr::new(ip, self.server_port)
    }
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => {
            value.trim().parse().map_err(|_| ConfigError::Invalid { var, value })
        }
        _ => Ok(default),
    }
}
