//! Single-instance guard for the listener role.
//!
//! Exactly one voxpick listener may own the producer port at a time. The
//! guard is a uid-scoped pid file: on acquire, a live prior instance found in
//! the file is sent SIGTERM and given a short grace period to release the
//! port before we write our own pid. This replaces fragile process-name
//! matching with an explicit claim on the role.

use crate::defaults::STALE_INSTANCE_GRACE_MS;
use crate::error::{Result, VoxpickError};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::time::{Duration, sleep};
use tracing::{info, warn};

/// Pid-file claim on the listener role. Released on `release()` or Drop.
#[derive(Debug)]
pub struct InstanceGuard {
    path: PathBuf,
}

impl InstanceGuard {
    /// Default pid file location: `$XDG_RUNTIME_DIR/voxpick.pid`, falling
    /// back to a uid-scoped path under /tmp.
    pub fn default_path() -> PathBuf {
        if let Ok(xdg_runtime) = std::env::var("XDG_RUNTIME_DIR") {
            PathBuf::from(xdg_runtime).join("voxpick.pid")
        } else {
            let uid = unsafe { libc::getuid() };
            PathBuf::from(format!("/tmp/voxpick-{}.pid", uid))
        }
    }

    /// Claims the role, terminating a live stale instance first.
    ///
    /// Best-effort: a stale instance that ignores SIGTERM will still hold the
    /// port, and the subsequent bind surfaces that as a startup error.
    pub async fn acquire(path: PathBuf) -> Result<Self> {
        if let Some(pid) = read_pid(&path) {
            let own_pid = std::process::id() as i32;
            if pid != own_pid && process_alive(pid) {
                info!(pid, "terminating stale listener instance");
                unsafe {
                    libc::kill(pid, libc::SIGTERM);
                }
                sleep(Duration::from_millis(STALE_INSTANCE_GRACE_MS)).await;
                if process_alive(pid) {
                    warn!(pid, "stale instance still running after SIGTERM");
                }
            }
        }

        fs::write(&path, std::process::id().to_string()).map_err(|e| {
            VoxpickError::InstanceGuard {
                message: format!("failed to write pid file {}: {}", path.display(), e),
            }
        })?;

        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Removes the pid file if it still records this process.
    pub fn release(&self) {
        if read_pid(&self.path) == Some(std::process::id() as i32)
            && let Err(e) = fs::remove_file(&self.path)
        {
            warn!("failed to remove pid file {}: {}", self.path.display(), e);
        }
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        self.release();
    }
}

fn read_pid(path: &Path) -> Option<i32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Signal 0 probes for existence without delivering anything.
fn process_alive(pid: i32) -> bool {
    unsafe { libc::kill(pid, 0) == 0 }
}
