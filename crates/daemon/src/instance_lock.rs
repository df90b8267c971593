// SPDX-License-Identifier: MIT

//! Single-writer instance guarantee.
//!
//! Grounded on `oj`'s own `lifecycle/startup.rs` pid-file acquisition
//! (`fs2::FileExt::try_lock_exclusive`, write pid, keep the file handle
//! alive for the process lifetime), trimmed of the WAL/snapshot/breadcrumb
//! bootstrapping that file also does — only the claim registry and
//! project registry need durability here (§6).

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::DaemonError;

/// Holds the exclusive lock on `fabd.pid` for the process lifetime.
/// Dropping it releases the OS-level advisory lock; the file itself is
/// left behind (its presence plus a failed `try_lock_exclusive` is what a
/// second instance uses to detect a live daemon).
pub struct InstanceLock {
    _file: std::fs::File,
    pid_path: PathBuf,
}

impl InstanceLock {
    /// Acquires the lock under `fab_dir`, creating the directory and
    /// writing the current pid. Fails with [`DaemonError::AlreadyRunning`]
    /// if another instance holds it.
    pub fn acquire(fab_dir: &Path) -> Result<Self, DaemonError> {
        std::fs::create_dir_all(fab_dir)?;
        let pid_path = fab_dir.join("fabd.pid");

        let file = OpenOptions::new().write(true).create(true).truncate(false).open(&pid_path)?;
        if file.try_lock_exclusive().is_err() {
            let existing_pid = std::fs::read_to_string(&pid_path)
                .ok()
                .and_then(|s| s.trim().parse::<u32>().ok())
                .unwrap_or(0);
            return Err(DaemonError::AlreadyRunning(existing_pid));
        }

        let mut file = file;
        file.set_len(0)?;
        writeln!(file, "{}", std::process::id())?;
        file.sync_all()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&pid_path, std::fs::Permissions::from_mode(0o600))?;
        }

        Ok(Self { _file: file, pid_path })
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.pid_path);
    }
}

#[cfg(test)]
#[path = "instance_lock_tests.rs"]
mod tests;
