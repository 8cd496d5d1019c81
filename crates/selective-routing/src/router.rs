//! Selective routing of HTTP traffic through the local upstream proxy

use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use http::Uri;
use tracing::debug;

use crate::policy::{Result, RouteDecision, RoutingPolicy};

/// Routes public HTTP(S) destinations through the upstream proxy and
/// everything else directly
///
/// The decision is made before DNS resolution, so only dotted-quad IPv4
/// literals are checked against the private ranges. DNS names and IPv6
/// literals that survive the scheme and loopback rules go upstream; the
/// asymmetry with IPv6 is intentional.
pub struct SelectiveRouter {
    upstream: SocketAddr,
    fallback: Option<Arc<dyn RoutingPolicy>>,
}

impl SelectiveRouter {
    /// Create a router targeting `upstream`, optionally wrapping the policy
    /// it replaced
    pub fn new(upstream: SocketAddr, fallback: Option<Arc<dyn RoutingPolicy>>) -> Self {
        Self { upstream, fallback }
    }

    /// The upstream proxy address this router redirects to
    pub fn upstream(&self) -> SocketAddr {
        self.upstream
    }
}

impl RoutingPolicy for SelectiveRouter {
    fn select(&self, uri: &Uri) -> RouteDecision {
        // Only HTTP-family traffic is ever redirected.
        match uri.scheme_str() {
            Some("http") | Some("https") => {}
            _ => return RouteDecision::Direct,
        }

        let host = uri.host().unwrap_or("");
        if host.is_empty() || host == "localhost" || host == "127.0.0.1" {
            return RouteDecision::Direct;
        }

        if let Some(ip) = parse_ipv4_literal(host) {
            if is_private_ipv4(ip) {
                return RouteDecision::Direct;
            }
        }

        RouteDecision::ViaUpstream(self.upstream)
    }

    fn connect_failed(&self, uri: &Uri, error: &io::Error) -> Result<()> {
        if let Some(fallback) = &self.fallback {
            // A misbehaving fallback must not destabilize later decisions.
            if let Err(e) = fallback.connect_failed(uri, error) {
                debug!(error = %e, %uri, "fallback policy rejected connect-failed notification");
            }
        }
        Ok(())
    }
}

/// Parse a host that is exactly four dot-separated integers in [0, 255]
fn parse_ipv4_literal(host: &str) -> Option<Ipv4Addr> {
    let mut octets = [0u8; 4];
    let mut parts = host.split('.');
    for octet in &mut octets {
        *octet = parts.next()?.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(Ipv4Addr::from(octets))
}

/// 10/8, 127/8, 169.254/16, 172.16/12 and 192.168/16
fn is_private_ipv4(ip: Ipv4Addr) -> bool {
    ip.is_private() || ip.is_loopback() || ip.is_link_local()
}
