//! Client address extraction for request logging.
//!
//! Checks, in order:
//! 1. First entry of `X-Forwarded-For`
//! 2. `X-Real-IP`
//! 3. The socket peer address from axum's `ConnectInfo`
//!
//! The forwarded headers are client-controlled unless a reverse proxy
//! overwrites them; the value is only used for logging, never for access
//! decisions.

use std::net::SocketAddr;

use axum::extract::ConnectInfo;
use axum::http::Request;

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_REAL_IP: &str = "x-real-ip";

/// Best-effort client address of a request.
pub fn client_ip<B>(req: &Request<B>) -> Option<String> {
    let forwarded = req
        .headers()
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(ip) = forwarded {
        return Some(ip.to_string());
    }

    if let Some(ip) = req
        .headers()
        .get(X_REAL_IP)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return Some(ip.to_string());
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
}
