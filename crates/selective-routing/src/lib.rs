//! Per-connection routing decisions for a local upstream proxy
//!
//! This crate answers one question for every outbound connection the host
//! process makes: go through the local upstream proxy, or connect directly?
//! The decision runs before DNS resolution and is made by a pure
//! [`RoutingPolicy`]; the [`RoutingContext`] holds whichever policy is
//! currently active for the whole process and knows how to swap the
//! [`SelectiveRouter`] in and out without losing the policy it replaced.

#![warn(missing_docs)]

mod context;
mod policy;
mod router;

pub use context::RoutingContext;
pub use policy::{DirectPolicy, Result, RouteDecision, RoutingError, RoutingPolicy};
pub use router::SelectiveRouter;
