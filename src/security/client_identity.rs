//! Client identification for rate limiting.
//!
//! # Responsibilities
//! - Pick the calling client's address from proxy headers, in priority order
//! - Fall back to the transport peer address
//! - Never fail: unknown callers share a sentinel identity
//!
//! # Design Decisions
//! - `X-Forwarded-For` contributes only its left-most (originating) entry
//! - Empty header values are skipped rather than producing an empty identity

use std::net::SocketAddr;

use axum::http::HeaderMap;

/// Identity used when neither headers nor the peer address are available.
pub const UNKNOWN_CLIENT: &str = "unknown-client";

/// Forwarding headers consulted, highest priority first.
pub const FORWARDING_HEADERS: [&str; 3] = ["x-real-ip", "x-forwarded-for", "cf-connecting-ip"];

/// Transport peer address, attached to requests by the server adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeerAddr(pub SocketAddr);

/// Resolve a stable identifier for the caller.
pub fn resolve_client_id(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    for name in FORWARDING_HEADERS {
        let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) else {
            continue;
        };
        let candidate = if name == "x-forwarded-for" {
            value.split(',').next().unwrap_or_default().trim()
        } else {
            value.trim()
        };
        if !candidate.is_empty() {
            return candidate.to_string();
        }
    }

    match peer {
        Some(addr) => addr.ip().to_string(),
        None => UNKNOWN_CLIENT.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    fn peer() -> Option<SocketAddr> {
        Some("10.0.0.9:51234".parse().unwrap())
    }

    #[test]
    fn test_real_ip_wins() {
        let h = headers(&[
            ("x-real-ip", "203.0.113.7"),
            ("x-forwarded-for", "198.51.100.1, 10.0.0.1"),
            ("cf-connecting-ip", "192.0.2.44"),
        ]);
        assert_eq!(resolve_client_id(&h, peer()), "203.0.113.7");
    }

    #[test]
    fn test_forwarded_for_takes_leftmost_trimmed() {
        let h = headers(&[("x-forwarded-for", "  198.51.100.1 , 10.0.0.1, 10.0.0.2")]);
        assert_eq!(resolve_client_id(&h, peer()), "198.51.100.1");
    }

    #[test]
    fn test_cdn_header_used_last() {
        let h = headers(&[("cf-connecting-ip", "192.0.2.44")]);
        assert_eq!(resolve_client_id(&h, peer()), "192.0.2.44");
    }

    #[test]
    fn test_header_names_case_insensitive() {
        let mut h = HeaderMap::new();
        h.insert("X-Real-IP", HeaderValue::from_static("203.0.113.8"));
        assert_eq!(resolve_client_id(&h, None), "203.0.113.8");
    }

    #[test]
    fn test_empty_header_skipped() {
        let h = headers(&[("x-real-ip", ""), ("x-forwarded-for", " , 10.0.0.1")]);
        assert_eq!(resolve_client_id(&h, peer()), "10.0.0.9");
    }

    #[test]
    fn test_peer_fallback_and_sentinel() {
        let h = HeaderMap::new();
        assert_eq!(resolve_client_id(&h, peer()), "10.0.0.9");
        assert_eq!(resolve_client_id(&h, None), UNKNOWN_CLIENT);
    }
}
