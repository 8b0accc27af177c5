//! SSRF (Server-Side Request Forgery) filtering.
//!
//! [`is_allowed`] is a hostname denylist for loopback and internal names.
//! It is a best-effort filter and not a substitute for network-level egress
//! restriction: public names that resolve to private addresses pass it.
//! [`check_resolved`] closes that gap by resolving the host and validating
//! every answer, and is enabled through configuration.
use std::net::IpAddr;

use crate::fetch::url::NormalizedUrl;

/// Hostnames rejected outright.
pub const BLOCKED_HOSTS: &[&str] = &["localhost", "127.0.0.1", "0.0.0.0"];

/// Hostname suffixes rejected outright.
pub const BLOCKED_SUFFIXES: &[&str] = &[".localhost", ".local", ".internal"];

/// Error type for SSRF validation failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SsrfError {
    #[error("blocked host: {0}")]
    BlockedHost(String),

    #[error("blocked IP: {0} (private/reserved)")]
    BlockedIp(IpAddr),

    #[error("DNS resolution failed: {0}")]
    DnsError(String),
}

impl From<SsrfError> for siteintel_core::Error {
    fn from(err: SsrfError) -> Self {
        match err {
            SsrfError::DnsError(msg) => siteintel_core::Error::FetchFailed(msg),
            other => siteintel_core::Error::UrlNotAllowed(other.to_string()),
        }
    }
}

/// Check a normalized address against the internal-host denylist.
pub fn is_allowed(url: &NormalizedUrl) -> bool {
    is_allowed_host(url.host_str())
}

fn is_allowed_host(host: &str) -> bool {
    let host = host.trim_end_matches('.').to_ascii_lowercase();

    if BLOCKED_HOSTS.contains(&host.as_str()) {
        return false;
    }

    !BLOCKED_SUFFIXES.iter().any(|suffix| host.ends_with(suffix))
}

/// Check if an IP address is private, reserved, or otherwise blocked.
///
/// This covers:
/// - Loopback addresses (127.0.0.0/8, ::1)
/// - RFC 1918 private ranges (10/8, 172.16/12, 192.168/16)
/// - Link-local addresses (169.254/16, fe80::/10)
/// - Multicast addresses (224/4, ff00::/8)
/// - Unspecified addresses (0.0.0.0/8, ::)
/// - IPv6 unique local (fc00::/7)
/// - IPv4-mapped IPv6 forms of all of the above
pub fn is_private_or_reserved(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_multicast()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || v4.octets()[0] == 0
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_private_or_reserved(IpAddr::V4(v4));
            }
            v6.is_loopback()
                || v6.is_multicast()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}

/// Validate that an IP address is not private or reserved.
pub fn validate_ip(ip: IpAddr) -> Result<(), SsrfError> {
    if is_private_or_reserved(ip) { Err(SsrfError::BlockedIp(ip)) } else { Ok(()) }
}

/// Resolve the address's host and require every answer to be public.
///
/// Literal IP hosts are validated directly without a lookup.
pub async fn check_resolved(url: &NormalizedUrl) -> Result<(), SsrfError> {
    match url.as_url().host() {
        Some(url::Host::Ipv4(v4)) => return validate_ip(IpAddr::V4(v4)),
        Some(url::Host::Ipv6(v6)) => return validate_ip(IpAddr::V6(v6)),
        Some(url::Host::Domain(_)) => {}
        None => return Err(SsrfError::BlockedHost(String::new())),
    }

    let host = url.host_str();
    let addrs = tokio::net::lookup_host((host, url.port_or_default()))
        .await
        .map_err(|e| SsrfError::DnsError(format!("{host}: {e}")))?;

    let mut resolved_any = false;
    for addr in addrs {
        resolved_any = true;
        validate_ip(addr.ip())?;
    }

    if !resolved_any {
        return Err(SsrfError::DnsError(format!("{host}: no addresses")));
    }

    tracing::debug!("resolved {} to public addresses only", host);
    Ok(())
}
