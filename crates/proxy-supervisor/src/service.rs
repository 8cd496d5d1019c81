//! The supervisor control service

use std::sync::Arc;

use engine_process::EngineProcess;
use futures::lock::Mutex;
use selective_routing::RoutingContext;
use tracing::info;

use crate::config::EngineSettings;
use crate::config_writer::ConfigWriter;
use crate::prefs::PreferenceStore;
use crate::status::StatusCell;

/// Drives the engine process and routing context from control intents
///
/// Intents are serialized: each one runs to completion while holding the
/// engine lock, so a racing start and stop cannot interleave their engine and
/// routing calls. Intent results are observable only through the status
/// channel and the persisted last status; no intent returns a value.
pub struct Supervisor {
    settings: EngineSettings,
    engine: Mutex<EngineProcess>,
    routing: Arc<RoutingContext>,
    config: Box<dyn ConfigWriter>,
    prefs: Arc<dyn PreferenceStore>,
    status: StatusCell,
}

impl Supervisor {
    /// Create a supervisor
    ///
    /// The status cell is seeded from the persisted last status so observers
    /// attaching before any intent has run still see something meaningful.
    pub fn new(
        settings: EngineSettings,
        routing: Arc<RoutingContext>,
        config: Box<dyn ConfigWriter>,
        prefs: Arc<dyn PreferenceStore>,
    ) -> Self {
        let status = StatusCell::new(prefs.last_status());
        Self {
            settings,
            engine: Mutex::new(EngineProcess::new()),
            routing,
            config,
            prefs,
            status,
        }
    }

    /// Latest published status
    pub fn status(&self) -> String {
        self.status.latest()
    }

    /// Subscribe to status transitions
    pub fn subscribe(&self) -> async_channel::Receiver<String> {
        self.status.subscribe()
    }

    /// Routing context consulted by the host's outbound connections
    pub fn routing(&self) -> &Arc<RoutingContext> {
        &self.routing
    }

    /// Whether an engine process is currently tracked
    ///
    /// Hosts that tear the service down when the engine is gone poll this
    /// after stop/apply-config intents.
    pub async fn engine_running(&self) -> bool {
        self.engine.lock().await.is_running()
    }

    /// Start the engine and, when the routing flag is set, install selective
    /// routing
    ///
    /// A config-write failure terminates the intent before the engine is
    /// touched.
    pub async fn request_start(&self) {
        let mut engine = self.engine.lock().await;

        let status = match self.config.ensure_written().await {
            Ok(()) => {
                let work_dir = self.config.base_dir().to_path_buf();
                let args = self.settings.engine_args(&work_dir);
                engine
                    .start(&work_dir, &self.settings.executable, &args)
                    .await
                    .to_string()
            }
            Err(e) => format!("config write failed: {e}"),
        };

        self.sync_routing(&engine);
        self.finish_intent(&status);
    }

    /// Stop the engine and uninstall selective routing
    ///
    /// Routing is disabled even when the engine was already stopped, so no
    /// policy is ever left dangling.
    pub async fn request_stop(&self) {
        let mut engine = self.engine.lock().await;

        let status = engine.stop().await.to_string();
        self.prefs.set_last_status(&status);
        self.routing.disable();

        info!(status, "intent complete");
        self.status.publish(&status);
    }

    /// Rewrite the engine configuration, restarting the engine when it is
    /// running with routing enabled
    ///
    /// When the engine is not running (or routing is off) the configuration
    /// is saved without touching the process.
    pub async fn request_apply_config(&self) {
        let mut engine = self.engine.lock().await;

        let status = match self.config.ensure_written().await {
            Ok(()) => {
                if engine.is_running() && self.prefs.proxy_enabled() {
                    let work_dir = self.config.base_dir().to_path_buf();
                    let args = self.settings.engine_args(&work_dir);
                    engine
                        .restart(&work_dir, &self.settings.executable, &args)
                        .await
                        .to_string()
                } else {
                    "config saved".to_string()
                }
            }
            Err(e) => format!("config write failed: {e}"),
        };

        self.sync_routing(&engine);
        self.finish_intent(&status);
    }

    /// Re-publish the persisted last status to observers
    pub async fn request_status_refresh(&self) {
        self.status.publish(&self.prefs.last_status());
    }

    /// Install selective routing when the engine runs with the flag set
    fn sync_routing(&self, engine: &EngineProcess) {
        if engine.is_running() && self.prefs.proxy_enabled() {
            self.routing.enable(self.settings.upstream);
        }
    }

    fn finish_intent(&self, status: &str) {
        info!(status, "intent complete");
        self.prefs.set_last_status(status);
        self.status.publish(status);
    }
}
