//! Client identification utilities

use axum::http::HeaderMap;
use std::net::IpAddr;

/// Client IP for per-client limits
///
/// Prefers the first address in `X-Forwarded-For`, then `X-Real-IP`, then
/// the peer address of the connection.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok());

    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<IpAddr>().ok())
        })
        .or(direct_ip)
}
