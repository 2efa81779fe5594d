use std::net::{IpAddr, SocketAddr};

use chrono::Utc;
use nullnet_liberror::{location, Error, ErrorHandler, Location};

pub fn get_timestamp_string() -> String {
    Utc::now().to_rfc3339()
}

/// Returns a value embedded at build time, or an empty string (with a warning) when missing.
pub fn get_env(value: Option<&'static str>, name: &str) -> &'static str {
    value.unwrap_or_else(|| {
        log::warn!("{name} not found in environment at build time");
        ""
    })
}

/// Accepts either a bare IP address or a socket address (`ip:port`, `[ipv6]:port`).
pub fn parse_source_ip(s: &str) -> Result<IpAddr, Error> {
    let s = s.trim();
    if let Ok(ip) = s.parse::<IpAddr>() {
        return Ok(ip);
    }
    s.parse::<SocketAddr>()
        .map(|addr| addr.ip())
        .handle_err(location!())
}
