// ABOUTME: Cross-process run lock so overlapping scheduler firings cannot
// ABOUTME: race each other into rotating the same refresh token

use crate::{Error, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Held for the duration of a sync run; the lock file is removed on drop.
/// A file left behind by a killed process is reclaimed once its recorded
/// pid is no longer alive, so an unattended schedule heals itself.
#[derive(Debug)]
pub struct RunLock {
    path: PathBuf,
}

impl RunLock {
    pub fn acquire(path: PathBuf) -> Result<RunLock> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        match Self::try_create(&path) {
            Ok(lock) => Ok(lock),
            Err(Error::Locked(owner)) => {
                if Self::is_stale(&path) {
                    let _ = std::fs::remove_file(&path);
                    Self::try_create(&path)
                } else {
                    Err(Error::Locked(owner))
                }
            }
            Err(e) => Err(e),
        }
    }

    fn try_create(path: &PathBuf) -> Result<RunLock> {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                let _ = writeln!(file, "{}", std::process::id());
                Ok(RunLock { path: path.clone() })
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                let owner = std::fs::read_to_string(path).unwrap_or_default();
                Err(Error::Locked(format!(
                    "{} held by pid {}",
                    path.display(),
                    owner.trim()
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// A lock without a readable live pid belongs to a dead run.
    fn is_stale(path: &PathBuf) -> bool {
        let Ok(content) = std::fs::read_to_string(path) else {
            return false;
        };
        match content.trim().parse::<i32>() {
            Ok(pid) => !process_alive(pid),
            Err(_) => true,
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Signal 0 probes for existence without sending anything; EPERM still
/// means the process exists.
#[cfg(unix)]
fn process_alive(pid: i32) -> bool {
    if unsafe { libc::kill(pid, 0) } == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
fn process_alive(_pid: i32) -> bool {
    true
}
