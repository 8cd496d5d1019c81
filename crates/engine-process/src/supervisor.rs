//! Supervision of the proxy-engine child process

use std::path::Path;
use std::time::Duration;

use async_io::Timer;
use async_process::{Child, Command, Stdio};
use futures_lite::{AsyncReadExt, future};
use tracing::{debug, warn};

use crate::outcome::{StartOutcome, StopOutcome};

/// Bounded wait after requesting termination before the engine is assumed gone
pub const STOP_GRACE: Duration = Duration::from_millis(1500);

/// Supervises at most one local proxy-engine process
///
/// The tracked handle reflects only what this supervisor spawned; it is not a
/// liveness probe of the underlying OS process. A second `start` while a
/// handle is tracked reports `AlreadyRunning` without spawning.
pub struct EngineProcess {
    child: Option<Child>,
}

impl EngineProcess {
    /// Create a supervisor with no tracked engine
    pub fn new() -> Self {
        Self { child: None }
    }

    /// Whether an engine handle is currently tracked
    pub fn is_running(&self) -> bool {
        self.child.is_some()
    }

    /// Spawn the engine, if none is tracked
    ///
    /// Both output pipes are drained on a dedicated background worker for the
    /// life of the process so the engine is never blocked on a full pipe; the
    /// drained bytes are discarded.
    pub async fn start(
        &mut self,
        work_dir: &Path,
        executable: &Path,
        args: &[String],
    ) -> StartOutcome {
        if self.child.is_some() {
            return StartOutcome::AlreadyRunning;
        }

        if !executable.exists() {
            return StartOutcome::NotFound(executable.to_path_buf());
        }

        // Execute permission may be missing when the binary was unpacked
        // from an archive; setting it can still fail on read-only mounts.
        #[cfg(unix)]
        set_executable(executable);

        let mut cmd = Command::new(executable);
        cmd.args(args)
            .current_dir(work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => return StartOutcome::SpawnFailed(e.to_string()),
        };

        let pid = child.id();
        drain_output(&mut child);
        debug!(pid, executable = %executable.display(), "engine spawned");

        self.child = Some(child);
        StartOutcome::Started { pid }
    }

    /// Request graceful termination and wait up to [`STOP_GRACE`]
    ///
    /// The handle is cleared whether or not the OS confirms the exit within
    /// the bound; the outcome variant tells the two apart. The caller is
    /// never blocked past the grace period.
    pub async fn stop(&mut self) -> StopOutcome {
        let Some(mut child) = self.child.take() else {
            return StopOutcome::NotRunning;
        };

        terminate(&mut child);

        let exit = future::or(
            async {
                match child.status().await {
                    Ok(status) => Some(status.code()),
                    Err(e) => {
                        warn!(error = %e, "waiting for engine exit failed");
                        Some(None)
                    }
                }
            },
            async {
                Timer::after(STOP_GRACE).await;
                None
            },
        )
        .await;

        match exit {
            Some(code) => {
                debug!(?code, "engine exited");
                StopOutcome::Exited { code }
            }
            None => {
                warn!("engine did not exit within the grace period, assuming gone");
                StopOutcome::AssumedExited
            }
        }
    }

    /// `stop` followed by `start`; no atomicity against concurrent callers
    pub async fn restart(
        &mut self,
        work_dir: &Path,
        executable: &Path,
        args: &[String],
    ) -> StartOutcome {
        self.stop().await;
        self.start(work_dir, executable, args).await
    }
}

impl Default for EngineProcess {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        // The engine must not outlive its supervisor.
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
        }
    }
}

/// Ask the engine to exit
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        use nix::sys::signal::{self, Signal};
        use nix::unistd::Pid;

        let pid = Pid::from_raw(child.id() as i32);
        if let Err(e) = signal::kill(pid, Signal::SIGTERM) {
            warn!(error = %e, "failed to signal engine, falling back to kill");
            let _ = child.kill();
        }
    }

    #[cfg(not(unix))]
    {
        let _ = child.kill();
    }
}

/// Drain both output pipes until the engine closes them
///
/// Runs on a dedicated worker thread for the lifetime of the process; the
/// sink never applies backpressure and the worker ends when the pipes close.
fn drain_output(child: &mut Child) {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let result = std::thread::Builder::new()
        .name("engine-output".into())
        .spawn(move || {
            future::block_on(async move {
                let drain_stdout = async {
                    if let Some(mut stdout) = stdout {
                        discard(&mut stdout).await;
                    }
                };
                let drain_stderr = async {
                    if let Some(mut stderr) = stderr {
                        discard(&mut stderr).await;
                    }
                };
                future::zip(drain_stdout, drain_stderr).await;
            });
        });

    if let Err(e) = result {
        warn!(error = %e, "failed to spawn engine output drain");
    }
}

async fn discard<R: futures_lite::AsyncRead + Unpin>(reader: &mut R) {
    let mut buf = [0u8; 8192];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    if let Ok(metadata) = fs::metadata(path) {
        let mut perms = metadata.permissions();
        if perms.mode() & 0o111 == 0 {
            perms.set_mode(perms.mode() | 0o755);
            let _ = fs::set_permissions(path, perms);
        }
    }
}
