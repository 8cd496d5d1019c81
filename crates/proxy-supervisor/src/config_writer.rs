//! Materialization of the engine's on-disk configuration

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

/// Writes the proxy engine's configuration before the engine is started or
/// reconfigured
///
/// `ensure_written` must be idempotent: when nothing changed it must not
/// error, and it must not churn the engine's own state under `base_dir`.
#[async_trait]
pub trait ConfigWriter: Send + Sync {
    /// Directory the engine runs in and reads its configuration from
    fn base_dir(&self) -> &Path;

    /// Ensure the configuration on disk is current
    async fn ensure_written(&self) -> std::io::Result<()>;
}

/// Config writer that materializes a pre-rendered configuration string
pub struct StaticConfigWriter {
    base_dir: PathBuf,
    contents: String,
}

/// File name the engine expects inside its working directory
const CONFIG_FILE: &str = "config.yaml";

impl StaticConfigWriter {
    /// Create a writer placing `contents` at `<base_dir>/config.yaml`
    pub fn new(base_dir: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.into(),
            contents: contents.into(),
        }
    }
}

#[async_trait]
impl ConfigWriter for StaticConfigWriter {
    fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    async fn ensure_written(&self) -> std::io::Result<()> {
        async_fs::create_dir_all(&self.base_dir).await?;

        let path = self.base_dir.join(CONFIG_FILE);
        if let Ok(existing) = async_fs::read(&path).await {
            if existing == self.contents.as_bytes() {
                debug!(path = %path.display(), "engine config unchanged");
                return Ok(());
            }
        }

        async_fs::write(&path, self.contents.as_bytes()).await?;
        debug!(path = %path.display(), "engine config written");
        Ok(())
    }
}
