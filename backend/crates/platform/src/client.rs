//! Client identification utilities
//!
//! Extracts the originating client IP from HTTP headers, for use as a
//! per-device key when storing refresh tokens.

use axum::http::HeaderMap;
use std::net::{IpAddr, Ipv4Addr};

/// Extract client IP address from headers
///
/// Checks `X-Forwarded-For` first (reverse proxy setups), then
/// `X-Real-IP`, then falls back to the direct connection IP.
/// The IPv6 loopback is mapped to `127.0.0.1` so local clients get a
/// stable key regardless of which loopback family the socket used.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    let candidate = forwarded_for(headers)
        .or_else(|| real_ip(headers))
        .or(direct_ip);

    candidate.map(|ip| match ip {
        IpAddr::V6(v6) if v6.is_loopback() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        other => other,
    })
}

fn forwarded_for(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
}

fn real_ip(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<IpAddr>().ok())
}
