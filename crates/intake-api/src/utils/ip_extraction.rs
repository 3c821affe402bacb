//! Client IP extraction
//!
//! The address is forwarded to the CAPTCHA provider as `remoteip`. Forwarding headers are
//! only honoured when `TRUSTED_PROXY_COUNT` says a proxy sits in front of us; otherwise a
//! client could claim any address.

use crate::state::AppState;
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::{request::Parts, HeaderMap};
use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

/// Extract the client IP from forwarding headers or the socket address.
///
/// With `trusted_proxy_count == 0` only the socket address is used. With N trusted proxies
/// the client is the entry N positions from the end of `X-Forwarded-For`, then `X-Real-IP`
/// is tried, then the socket address.
pub fn extract_client_ip(
    headers: &HeaderMap,
    socket_addr: Option<&SocketAddr>,
    trusted_proxy_count: usize,
) -> Option<String> {
    if trusted_proxy_count > 0 {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| from_forwarded_for(v, trusted_proxy_count));
        if forwarded.is_some() {
            return forwarded;
        }

        let real_ip = headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|ip| is_valid_ip(ip));
        if let Some(ip) = real_ip {
            return Some(ip.to_string());
        }
    }

    socket_addr.map(|addr| addr.ip().to_string())
}

/// `client, proxy1, proxy2`: with two trusted proxies the client is `len - 2`.
fn from_forwarded_for(header_value: &str, trusted_proxy_count: usize) -> Option<String> {
    let ips: Vec<&str> = header_value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if ips.len() < trusted_proxy_count {
        return None;
    }

    let candidate = ips.get(ips.len() - trusted_proxy_count)?;
    is_valid_ip(candidate).then(|| candidate.to_string())
}

fn is_valid_ip(ip_str: &str) -> bool {
    ip_str.parse::<IpAddr>().is_ok()
}

/// Extractor yielding the best-known client IP, or `None` when the server runs without
/// connect info (as in tests).
#[derive(Debug, Clone)]
pub struct ClientIp(pub Option<String>);

impl FromRequestParts<Arc<AppState>> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let socket_addr = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);

        Ok(ClientIp(extract_client_ip(
            &parts.headers,
            socket_addr.as_ref(),
            state.config.trusted_proxy_count(),
        )))
    }
}
