//! Outcomes of supervisor operations
//!
//! Failure modes are variants here, never errors: the only consumer of these
//! results is a human-readable status line, so each outcome renders itself
//! through `Display` at the control boundary while callers keep typed
//! dispatch internally.

use std::fmt;
use std::path::PathBuf;

/// Result of a start request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// The engine was spawned and is now tracked
    Started {
        /// OS process id of the spawned engine
        pid: u32,
    },
    /// An engine is already tracked; nothing was spawned
    AlreadyRunning,
    /// The executable does not exist at the resolved path
    NotFound(PathBuf),
    /// The OS refused to spawn the process
    SpawnFailed(String),
}

impl StartOutcome {
    /// True when the outcome left a tracked engine behind
    pub fn running(&self) -> bool {
        matches!(
            self,
            StartOutcome::Started { .. } | StartOutcome::AlreadyRunning
        )
    }
}

impl fmt::Display for StartOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartOutcome::Started { pid } => write!(f, "engine started (pid {pid})"),
            StartOutcome::AlreadyRunning => write!(f, "engine already running"),
            StartOutcome::NotFound(path) => write!(f, "engine not found: {}", path.display()),
            StartOutcome::SpawnFailed(reason) => write!(f, "engine start failed: {reason}"),
        }
    }
}

/// Result of a stop request
///
/// `Exited` and `AssumedExited` are deliberately distinct: the supervisor
/// clears its handle in both cases, but only the former is a confirmed exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// No engine was tracked
    NotRunning,
    /// The engine exited within the grace period
    Exited {
        /// Exit code, `None` when the engine was killed by a signal
        code: Option<i32>,
    },
    /// The grace period elapsed without a confirmed exit; the handle was
    /// cleared anyway
    AssumedExited,
}

impl fmt::Display for StopOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopOutcome::NotRunning => write!(f, "engine not running"),
            StopOutcome::Exited { .. } => write!(f, "engine stopped"),
            StopOutcome::AssumedExited => write!(f, "engine stopped (exit unconfirmed)"),
        }
    }
}
