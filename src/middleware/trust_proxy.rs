use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Http,
    Https,
}

/// 解析后的客户端信息，挂在请求扩展上
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: String,
    pub protocol: Protocol,
}

impl ClientInfo {
    pub fn is_https(&self) -> bool {
        self.protocol == Protocol::Https
    }
}

/// 是否信任上游代理的 `X-Forwarded-*` 头
#[derive(Debug, Clone, Copy)]
pub struct TrustProxy(pub bool);

pub fn resolve_client(
    headers: &HeaderMap,
    remote: Option<SocketAddr>,
    trust_proxy: bool,
) -> ClientInfo {
    let remote_ip = remote.map(|addr| addr.ip().to_string());

    if !trust_proxy {
        return ClientInfo {
            ip: remote_ip.unwrap_or_else(|| "unknown".to_string()),
            protocol: Protocol::Http,
        };
    }

    // 从请求头中获取IP，或者使用连接信息中的IP作为默认值
    let ip = headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .filter(|ip| !ip.trim().is_empty())
        .or_else(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.split(',').find(|ip| !ip.trim().is_empty()))
        })
        .or(remote_ip.as_deref())
        .unwrap_or("unknown")
        .trim()
        .to_string();

    let protocol = match headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
    {
        Some(proto) if proto.trim().eq_ignore_ascii_case("https") => Protocol::Https,
        _ => Protocol::Http,
    };

    ClientInfo { ip, protocol }
}

pub async fn trust_proxy(
    State(TrustProxy(trust)): State<TrustProxy>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0);
    let client = resolve_client(req.headers(), remote, trust);
    tracing::debug!(ip = %client.ip, protocol = ?client.protocol, "resolved client");

    req.extensions_mut().insert(client);
    next.run(req).await
}
