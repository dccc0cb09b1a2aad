//! Request-derived client details

use hyper::header::{HeaderMap, REFERER, USER_AGENT};
use sha2::{Digest, Sha256};
use std::net::{IpAddr, SocketAddr};

use crate::db::schemas::ClientInfo;

/// Longest header value kept verbatim
const MAX_HEADER_CHARS: usize = 512;

/// Client IP: first `X-Forwarded-For` entry when it parses, else the peer
pub fn client_ip(headers: &HeaderMap, remote: SocketAddr) -> IpAddr {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
        .unwrap_or_else(|| remote.ip())
}

/// SHA-256 hex digest of an IP address
pub fn hash_ip(ip: IpAddr) -> String {
    hex::encode(Sha256::digest(ip.to_string().as_bytes()))
}

/// Collect hashed IP, user agent and referer for an analytics event
pub fn client_info(headers: &HeaderMap, remote: SocketAddr) -> ClientInfo {
    ClientInfo {
        ip_hash: Some(hash_ip(client_ip(headers, remote))),
        user_agent: header_string(headers, USER_AGENT),
        referer: header_string(headers, REFERER),
    }
}

fn header_string(headers: &HeaderMap, name: hyper::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(|v| v.chars().take(MAX_HEADER_CHARS).collect())
}
