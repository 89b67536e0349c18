//! Root paths of the OS pseudo-filesystems.
//!
//! Collectors never hard-code `/sys` or `/proc`; they resolve every file
//! through [`Paths`] so the agent can run against a bind-mounted host tree or a
//! test fixture.

use std::path::{Path, PathBuf};

/// Default mount point of sysfs.
pub const DEFAULT_SYSFS_PATH: &str = "/sys";
/// Default mount point of procfs.
pub const DEFAULT_PROCFS_PATH: &str = "/proc";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    sysfs: PathBuf,
    procfs: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self::new(DEFAULT_SYSFS_PATH, DEFAULT_PROCFS_PATH)
    }
}

impl Paths {
    pub fn new(sysfs: impl Into<PathBuf>, procfs: impl Into<PathBuf>) -> Self {
        Self {
            sysfs: sysfs.into(),
            procfs: procfs.into(),
        }
    }

    pub fn sysfs(&self) -> &Path {
        &self.sysfs
    }

    pub fn procfs(&self) -> &Path {
        &self.procfs
    }

    /// Resolves a path relative to the sysfs root.
    pub fn sys_file_path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.sysfs.join(rel)
    }

    /// Resolves a path relative to the procfs root.
    pub fn proc_file_path(&self, rel: impl AsRef<Path>) -> PathBuf {
        self.procfs.join(rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths() {
        let paths = Paths::default();
        assert_eq!(
            paths.sys_file_path("devices/system/edac/mc"),
            PathBuf::from("/sys/devices/system/edac/mc")
        );
        assert_eq!(paths.proc_file_path("stat"), PathBuf::from("/proc/stat"));
    }

    #[test]
    fn test_custom_root() {
        let paths = Paths::new("/host/sys", "/host/proc");
        assert_eq!(paths.sysfs(), Path::new("/host/sys"));
        assert_eq!(
            paths.sys_file_path("devices/system/edac/mc"),
            PathBuf::from("/host/sys/devices/system/edac/mc")
        );
        assert_eq!(paths.proc_file_path("stat"), PathBuf::from("/host/proc/stat"));
    }
}
