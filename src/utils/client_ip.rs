//! Client address extraction for click attribution.

use axum::http::HeaderMap;
use std::net::SocketAddr;

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Returns the client IP of a request.
///
/// Behind a trusted proxy the first `X-Forwarded-For` hop is used when present;
/// otherwise the peer address of the connection.
///
/// # Examples
///
/// ```ignore
/// let peer: SocketAddr = "10.0.0.1:5000".parse().unwrap();
/// let mut headers = HeaderMap::new();
/// headers.insert("x-forwarded-for", "1.2.3.4, 10.0.0.1".parse().unwrap());
///
/// assert_eq!(client_ip(&headers, peer, true), "1.2.3.4");
/// assert_eq!(client_ip(&headers, peer, false), "10.0.0.1");
/// ```
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr, behind_proxy: bool) -> String {
    if behind_proxy
        && let Some(forwarded) = first_forwarded_hop(headers)
    {
        return forwarded;
    }

    peer.ip().to_string()
}

fn first_forwarded_hop(headers: &HeaderMap) -> Option<String> {
    headers
        .get(X_FORWARDED_FOR)?
        .to_str()
        .ok()?
        .split(',')
        .map(str::trim)
        .find(|hop| !hop.is_empty())
        .map(str::to_string)
}

/// Returns a header as a string, or an empty string when missing or not UTF-8.
pub fn header_or_empty(headers: &HeaderMap, name: axum::http::HeaderName) -> String {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
