//! Routing policy contract

use std::io;
use std::net::SocketAddr;

use http::Uri;
use thiserror::Error;

/// Error raised by a policy's connect-failure handling
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The policy rejected a connect-failed notification
    #[error("connect-failed notification rejected: {0}")]
    ConnectFailed(String),
}

/// Result type alias for policy operations
pub type Result<T> = std::result::Result<T, RoutingError>;

/// Per-connection routing decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Connect directly to the destination
    Direct,
    /// Connect through the local upstream proxy
    ViaUpstream(SocketAddr),
}

/// A routing policy consulted at connection time
///
/// Arbitrarily many connections may call `select` concurrently; decisions
/// must be cheap and must not depend on mutable state.
pub trait RoutingPolicy: Send + Sync {
    /// Decide how a connection to `uri` should be made
    fn select(&self, uri: &Uri) -> RouteDecision;

    /// Notification that a connection attempt for `uri` failed
    fn connect_failed(&self, _uri: &Uri, _error: &io::Error) -> Result<()> {
        Ok(())
    }
}

/// Policy that sends every connection directly
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectPolicy;

impl RoutingPolicy for DirectPolicy {
    fn select(&self, _uri: &Uri) -> RouteDecision {
        RouteDecision::Direct
    }
}
