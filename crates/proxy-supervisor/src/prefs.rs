//! Durable user preferences consumed by the control service

use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Status reported before any control intent has ever run
const DEFAULT_STATUS: &str = "stopped";

/// Key/value preferences the supervisor reads and writes
///
/// Writes are best-effort: a failing backing store must not disturb the
/// control flow, so none of these methods return errors.
pub trait PreferenceStore: Send + Sync {
    /// Whether selective routing should be enabled while the engine runs
    fn proxy_enabled(&self) -> bool;

    /// Persist the routing flag
    fn set_proxy_enabled(&self, enabled: bool);

    /// Last status line written by the control service, `"stopped"` when
    /// none has ever been written
    fn last_status(&self) -> String;

    /// Persist the latest status line
    fn set_last_status(&self, status: &str);

    /// Subscription URL the engine configuration is generated from
    fn subscription_url(&self) -> String;

    /// Persist the subscription URL, trimmed
    fn set_subscription_url(&self, url: &str);
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Prefs {
    #[serde(default)]
    proxy_enabled: bool,
    #[serde(default)]
    last_status: Option<String>,
    #[serde(default)]
    subscription_url: String,
}

impl Prefs {
    fn last_status(&self) -> String {
        self.last_status
            .clone()
            .unwrap_or_else(|| DEFAULT_STATUS.to_string())
    }
}

/// Preference store backed by a JSON file
pub struct JsonPreferenceStore {
    path: PathBuf,
    prefs: Mutex<Prefs>,
}

impl JsonPreferenceStore {
    /// Open the store at `path`, starting from defaults when the file is
    /// missing or unreadable
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let prefs = std::fs::read_to_string(&path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default();
        Self {
            path,
            prefs: Mutex::new(prefs),
        }
    }

    fn persist(&self, prefs: &Prefs) {
        let write = || -> crate::Result<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&self.path, serde_json::to_vec_pretty(prefs)?)?;
            Ok(())
        };
        if let Err(e) = write() {
            warn!(error = %e, path = %self.path.display(), "failed to persist preferences");
        }
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn proxy_enabled(&self) -> bool {
        self.prefs.lock().unwrap().proxy_enabled
    }

    fn set_proxy_enabled(&self, enabled: bool) {
        let mut prefs = self.prefs.lock().unwrap();
        prefs.proxy_enabled = enabled;
        self.persist(&prefs);
    }

    fn last_status(&self) -> String {
        self.prefs.lock().unwrap().last_status()
    }

    fn set_last_status(&self, status: &str) {
        let mut prefs = self.prefs.lock().unwrap();
        prefs.last_status = Some(status.to_string());
        self.persist(&prefs);
    }

    fn subscription_url(&self) -> String {
        self.prefs.lock().unwrap().subscription_url.clone()
    }

    fn set_subscription_url(&self, url: &str) {
        let mut prefs = self.prefs.lock().unwrap();
        prefs.subscription_url = url.trim().to_string();
        self.persist(&prefs);
    }
}

/// In-memory store for tests and ephemeral hosts
#[derive(Default)]
pub struct MemoryPreferenceStore {
    prefs: Mutex<Prefs>,
}

impl MemoryPreferenceStore {
    /// Create an empty store with the routing flag preset
    pub fn with_enabled(enabled: bool) -> Self {
        let store = Self::default();
        store.prefs.lock().unwrap().proxy_enabled = enabled;
        store
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn proxy_enabled(&self) -> bool {
        self.prefs.lock().unwrap().proxy_enabled
    }

    fn set_proxy_enabled(&self, enabled: bool) {
        self.prefs.lock().unwrap().proxy_enabled = enabled;
    }

    fn last_status(&self) -> String {
        self.prefs.lock().unwrap().last_status()
    }

    fn set_last_status(&self, status: &str) {
        self.prefs.lock().unwrap().last_status = Some(status.to_string());
    }

    fn subscription_url(&self) -> String {
        self.prefs.lock().unwrap().subscription_url.clone()
    }

    fn set_subscription_url(&self, url: &str) {
        self.prefs.lock().unwrap().subscription_url = url.trim().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_apply_when_the_file_is_missing() {
        let dir = TempDir::new().unwrap();
        let store = JsonPreferenceStore::open(dir.path().join("prefs.json"));

        assert!(!store.proxy_enabled());
        assert_eq!(store.last_status(), "stopped");
        assert_eq!(store.subscription_url(), "");
    }

    #[test]
    fn values_survive_a_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");

        let store = JsonPreferenceStore::open(&path);
        store.set_proxy_enabled(true);
        store.set_last_status("engine started (pid 42)");
        store.set_subscription_url("  https://example.com/sub  ");

        let reopened = JsonPreferenceStore::open(&path);
        assert!(reopened.proxy_enabled());
        assert_eq!(reopened.last_status(), "engine started (pid 42)");
        assert_eq!(reopened.subscription_url(), "https://example.com/sub");
    }

    #[test]
    fn corrupt_files_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = JsonPreferenceStore::open(&path);
        assert!(!store.proxy_enabled());
        assert_eq!(store.last_status(), "stopped");
    }
}
