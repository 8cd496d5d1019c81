//! Process-wide routing context

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, RwLock};

use tracing::info;

use crate::policy::{DirectPolicy, RoutingPolicy};
use crate::router::SelectiveRouter;

/// Holder of the routing policy active for the whole process
///
/// Constructed once and injected into whatever makes outbound connections.
/// `enable`/`disable` swap the active policy under a single lock while
/// arbitrarily many connections snapshot it through [`RoutingContext::current`];
/// readers never observe a partially-updated policy because the swap is a
/// whole-`Arc` replacement.
pub struct RoutingContext {
    /// Guards enable/disable so the saved original cannot be lost to a race
    saved: Mutex<Option<Arc<dyn RoutingPolicy>>>,
    /// The policy outbound connections consult
    active: RwLock<Arc<dyn RoutingPolicy>>,
}

impl RoutingContext {
    /// Create a context with the given default policy
    pub fn new(default_policy: Arc<dyn RoutingPolicy>) -> Self {
        Self {
            saved: Mutex::new(None),
            active: RwLock::new(default_policy),
        }
    }

    /// Create a context whose default sends every connection directly
    pub fn direct() -> Self {
        Self::new(Arc::new(DirectPolicy))
    }

    /// Snapshot of the policy outbound connections should consult now
    pub fn current(&self) -> Arc<dyn RoutingPolicy> {
        self.active.read().unwrap().clone()
    }

    /// Install a [`SelectiveRouter`] over the saved original policy
    ///
    /// The original is captured on the first call and never overwritten until
    /// [`RoutingContext::disable`]; repeated calls rebuild the router against
    /// that same original, so a changed upstream takes effect without losing
    /// what was there before the first enable.
    pub fn enable(&self, upstream: SocketAddr) {
        let mut saved = self.saved.lock().unwrap();
        let original = saved
            .get_or_insert_with(|| self.active.read().unwrap().clone())
            .clone();

        let router = SelectiveRouter::new(upstream, Some(original));
        *self.active.write().unwrap() = Arc::new(router);
        info!(%upstream, "selective routing enabled");
    }

    /// Restore whatever policy was active before the first `enable`
    ///
    /// No-op when selective routing is not enabled.
    pub fn disable(&self) {
        let mut saved = self.saved.lock().unwrap();
        if let Some(original) = saved.take() {
            *self.active.write().unwrap() = original;
            info!("selective routing disabled");
        }
    }

    /// Whether a selective router is currently installed
    pub fn is_enabled(&self) -> bool {
        self.saved.lock().unwrap().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::RouteDecision;
    use http::Uri;

    fn upstream(port: u16) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], port))
    }

    fn public_uri() -> Uri {
        "http://example.com/".parse().unwrap()
    }

    #[test]
    fn enable_installs_a_selective_router() {
        let ctx = RoutingContext::direct();
        assert_eq!(ctx.current().select(&public_uri()), RouteDecision::Direct);

        ctx.enable(upstream(7890));
        assert!(ctx.is_enabled());
        assert_eq!(
            ctx.current().select(&public_uri()),
            RouteDecision::ViaUpstream(upstream(7890))
        );
    }

    #[test]
    fn nested_enable_preserves_the_first_original() {
        let ctx = RoutingContext::direct();
        let original = ctx.current();

        ctx.enable(upstream(7890));
        let first_router = ctx.current();

        // Second enable with a different upstream rebuilds the router...
        ctx.enable(upstream(7891));
        let second_router = ctx.current();
        assert!(!Arc::ptr_eq(&first_router, &second_router));
        assert_eq!(
            second_router.select(&public_uri()),
            RouteDecision::ViaUpstream(upstream(7891))
        );

        // ...but one disable still restores the pre-first-enable policy.
        ctx.disable();
        assert!(!ctx.is_enabled());
        assert!(Arc::ptr_eq(&ctx.current(), &original));
    }

    #[test]
    fn disable_without_enable_is_a_no_op() {
        let ctx = RoutingContext::direct();
        let original = ctx.current();

        ctx.disable();
        assert!(!ctx.is_enabled());
        assert!(Arc::ptr_eq(&ctx.current(), &original));
    }
}
