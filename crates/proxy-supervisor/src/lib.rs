//! # Proxy Supervisor
//!
//! Control service for a local selective-routing proxy: it materializes the
//! engine's configuration, drives the [`engine_process`] supervisor, installs
//! and uninstalls selective routing in a [`selective_routing::RoutingContext`],
//! persists the last-known status, and publishes status transitions to
//! observers.
//!
//! Every control intent folds its result into a single human-readable status
//! line; no error crosses the intent boundary.
//!
//! ## Example
//!
//! ```no_run
//! use proxy_supervisor::{EngineSettings, MemoryPreferenceStore, StaticConfigWriter, Supervisor};
//! use selective_routing::RoutingContext;
//! use std::sync::Arc;
//!
//! # futures::executor::block_on(async {
//! let settings = EngineSettings {
//!     executable: "/usr/local/bin/mihomo".into(),
//!     extra_args: vec![],
//!     upstream: ([127, 0, 0, 1], 7890).into(),
//! };
//!
//! let supervisor = Supervisor::new(
//!     settings,
//!     Arc::new(RoutingContext::direct()),
//!     Box::new(StaticConfigWriter::new("/var/lib/engine", "mixed-port: 7890\n")),
//!     Arc::new(MemoryPreferenceStore::default()),
//! );
//!
//! supervisor.request_start().await;
//! # });
//! ```

#![warn(missing_docs)]

mod config;
mod config_writer;
mod prefs;
mod service;
mod status;

pub use config::EngineSettings;
pub use config_writer::{ConfigWriter, StaticConfigWriter};
pub use prefs::{JsonPreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use service::Supervisor;
pub use status::StatusCell;

/// Error types for supervisor persistence
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Failed to encode or decode preferences
    #[error("preference encoding error: {0}")]
    Encode(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
