//! Lifecycle supervision for a single local proxy-engine process
//!
//! This crate owns exactly one child process: the proxy engine. It knows how
//! to spawn it, keep its output drained, and terminate it within a bounded
//! grace period. It knows nothing about routing policy; callers decide what
//! a running engine means for the rest of the process.
//!
//! Every operation reports a closed [`StartOutcome`]/[`StopOutcome`] variant
//! rather than an error; the control layer renders these to its single
//! status channel.

#![warn(missing_docs)]

mod outcome;
mod supervisor;

pub use outcome::{StartOutcome, StopOutcome};
pub use supervisor::{EngineProcess, STOP_GRACE};
