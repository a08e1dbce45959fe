//! Per-profile PID file that keeps two builds from running at once.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("PID file error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to signal process {pid}: {source}")]
    Signal {
        pid: u32,
        #[source]
        source: io::Error,
    },
}

impl LockError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// What a PID file says about the build it guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidStatus {
    /// No PID file.
    NotRunning,
    /// The recorded process is alive.
    Running(u32),
    /// The recorded process is gone.
    Stale(u32),
    /// The file does not contain a PID.
    Corrupted,
}

/// Read the PID file at `path` and check the recorded process.
pub fn inspect_pid_file(path: &Path) -> Result<PidStatus, LockError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(PidStatus::NotRunning),
        Err(e) => return Err(LockError::io(path, e)),
    };

    Ok(match content.trim().parse::<u32>() {
        Ok(pid) if is_process_running(pid) => PidStatus::Running(pid),
        Ok(pid) => PidStatus::Stale(pid),
        Err(_) => PidStatus::Corrupted,
    })
}

/// Remove the PID file. A missing file is fine.
pub fn cleanup_pid_file(path: &Path) -> Result<(), LockError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(LockError::io(path, e)),
    }
}

/// Exclusive build lock held for the lifetime of the value.
#[derive(Debug)]
pub struct BuildLock {
    path: PathBuf,
    pid: u32,
}

impl BuildLock {
    /// Try to take the lock at `path`.
    ///
    /// Returns `Ok(None)` when a live process already holds it. Stale and
    /// corrupted PID files are removed and the lock is taken.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Option<Self>, LockError> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| LockError::io(parent, e))?;
        }

        let pid = std::process::id();

        // Second attempt only after clearing a stale file
        for _ in 0..2 {
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    if let Err(e) = write!(file, "{}", pid) {
                        let _ = fs::remove_file(&path);
                        return Err(LockError::io(&path, e));
                    }
                    tracing::debug!(path = %path.display(), pid, "Acquired build lock");
                    return Ok(Some(Self { path, pid }));
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    match inspect_pid_file(&path)? {
                        PidStatus::Running(owner) => {
                            tracing::info!(path = %path.display(), pid = owner, "Build lock held");
                            return Ok(None);
                        }
                        PidStatus::Stale(owner) => {
                            tracing::warn!(path = %path.display(), pid = owner, "Removing stale PID file");
                            cleanup_pid_file(&path)?;
                        }
                        PidStatus::Corrupted => {
                            tracing::warn!(path = %path.display(), "Removing corrupted PID file");
                            cleanup_pid_file(&path)?;
                        }
                        PidStatus::NotRunning => {}
                    }
                }
                Err(e) => return Err(LockError::io(&path, e)),
            }
        }

        Ok(None)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pid(&self) -> u32 {
        self.pid
    }
}

impl Drop for BuildLock {
    /// Removes the PID file only while it still records this lock's PID.
    /// After `graph stop` another build may already own the file.
    fn drop(&mut self) {
        let owner = match fs::read_to_string(&self.path) {
            Ok(content) => content.trim().parse::<u32>().ok(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => return,
            Err(e) => {
                tracing::warn!(error = %e, path = %self.path.display(), "Failed to read build lock");
                return;
            }
        };

        if owner != Some(self.pid) {
            tracing::debug!(
                pid = self.pid,
                path = %self.path.display(),
                "Build lock taken over by another process; leaving PID file"
            );
            return;
        }

        if let Err(e) = cleanup_pid_file(&self.path) {
            tracing::warn!(error = %e, "Failed to release build lock");
        }
    }
}

/// Whether a process with `pid` exists.
#[cfg(unix)]
pub fn is_process_running(pid: u32) -> bool {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        return false;
    };
    if pid <= 0 {
        return false;
    }
    // Signal 0 probes without delivering anything
    let rc = unsafe { libc::kill(pid, 0) };
    rc == 0 || io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
pub fn is_process_running(_pid: u32) -> bool {
    false
}

/// Ask the build process to shut down with SIGTERM.
#[cfg(unix)]
pub fn terminate(pid: u32) -> Result<(), LockError> {
    let raw = libc::pid_t::try_from(pid).map_err(|_| LockError::Signal {
        pid,
        source: io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"),
    })?;
    if unsafe { libc::kill(raw, libc::SIGTERM) } == 0 {
        Ok(())
    } else {
        Err(LockError::Signal {
            pid,
            source: io::Error::last_os_error(),
        })
    }
}

#[cfg(not(unix))]
pub fn terminate(pid: u32) -> Result<(), LockError> {
    Err(LockError::Signal {
        pid,
        source: io::Error::new(io::ErrorKind::Unsupported, "signals are only supported on unix"),
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_current_process_is_running() {
        assert!(is_process_running(std::process::id()));
    }

    #[test]
    fn test_invalid_pids_not_running() {
        assert!(!is_process_running(0));
        assert!(!is_process_running(u32::MAX));
    }
}
