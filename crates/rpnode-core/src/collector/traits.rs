//! Abstractions over the OS data sources collectors read from.
//!
//! `FileSystem` covers sysfs/procfs text files, `Sysctl` covers raw system
//! information queries. Both have a real implementation and an in-memory mock
//! (see [`crate::collector::mock`]) so collectors can be tested on any host.

use std::io;
use std::path::{Path, PathBuf};

/// Abstraction for filesystem operations.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists entries in a directory.
    ///
    /// Returns full paths of the direct children, in no particular order.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }
}

/// Raw system information query (BSD `sysctl` family).
pub trait Sysctl: Send + Sync {
    /// Returns the opaque value buffer for `name`, e.g. `kern.boottime`.
    fn sysctl_raw(&self, name: &str) -> io::Result<Vec<u8>>;
}

/// `sysctlbyname(3)` backed implementation.
///
/// Only available on targets that provide `sysctlbyname`; elsewhere every
/// query fails with [`io::ErrorKind::Unsupported`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RealSysctl;

impl RealSysctl {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(any(
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "macos",
    target_os = "ios"
))]
impl Sysctl for RealSysctl {
    fn sysctl_raw(&self, name: &str) -> io::Result<Vec<u8>> {
        let c_name = std::ffi::CString::new(name)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

        // First call sizes the buffer.
        let mut len: libc::size_t = 0;
        // SAFETY: `c_name` is a valid NUL-terminated string, a null old-value
        // pointer asks the kernel for the required length only.
        let rc = unsafe {
            libc::sysctlbyname(
                c_name.as_ptr(),
                std::ptr::null_mut(),
                &mut len,
                std::ptr::null_mut(),
                0,
            )
        };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }

        let mut buf = vec![0u8; len];
        // SAFETY: `buf` is writable for `len` bytes and `len` tells the kernel
        // how much it may write.
        let rc = unsafe {
            libc::sysctlbyname(
                c_name.as_ptr(),
                buf.as_mut_ptr().cast(),
                &mut len,
                std::ptr::null_mut(),
                0,
            )
        };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }

        buf.truncate(len);
        Ok(buf)
    }
}

#[cfg(not(any(
    target_os = "freebsd",
    target_os = "dragonfly",
    target_os = "macos",
    target_os = "ios"
)))]
impl Sysctl for RealSysctl {
    fn sysctl_raw(&self, name: &str) -> io::Result<Vec<u8>> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("sysctl {} is not available on this platform", name),
        ))
    }
}
