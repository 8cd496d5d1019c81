//! Supervisor configuration

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where the proxy engine lives and how to reach its upstream listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Path to the proxy-engine executable
    pub executable: PathBuf,

    /// Extra arguments appended after the working-directory flag
    #[serde(default)]
    pub extra_args: Vec<String>,

    /// Loopback address of the engine's proxy listener
    #[serde(default = "default_upstream")]
    pub upstream: SocketAddr,
}

fn default_upstream() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 7890))
}

impl EngineSettings {
    /// Arguments the engine is invoked with, given its working directory
    ///
    /// The engine always receives `-d <work_dir>` so it reads the materialized
    /// configuration from where the config writer put it.
    pub fn engine_args(&self, work_dir: &Path) -> Vec<String> {
        let mut args = vec!["-d".to_string(), work_dir.display().to_string()];
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_args_lead_with_the_working_directory() {
        let settings = EngineSettings {
            executable: "/opt/engine/mihomo".into(),
            extra_args: vec!["-f".into(), "custom.yaml".into()],
            upstream: default_upstream(),
        };

        let args = settings.engine_args(Path::new("/var/lib/engine"));
        assert_eq!(args, ["-d", "/var/lib/engine", "-f", "custom.yaml"]);
    }

    #[test]
    fn upstream_defaults_to_the_loopback_mixed_port() {
        let settings: EngineSettings =
            serde_json::from_str(r#"{"executable": "/opt/engine/mihomo"}"#).unwrap();
        assert_eq!(settings.upstream, default_upstream());
        assert!(settings.extra_args.is_empty());
    }
}
