//! In-memory mock filesystem for testing collectors without real sysfs/procfs.
//!
//! This module provides `MockFs` which simulates a filesystem in memory,
//! allowing tests to run on any host and in CI environments without EDAC
//! hardware.

use crate::collector::traits::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

/// In-memory filesystem for testing.
///
/// Stores files and directories in memory, allowing tests to simulate
/// various sysfs states (controllers present, counters missing, and so on).
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        self.add_parents(&path);
        self.directories.insert(path);
    }

    /// Removes a file, e.g. to simulate a counter that vanished.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) -> Option<String> {
        self.files.remove(path.as_ref())
    }

    /// Writes a single-value counter file `<dir>/<name>` containing `value`.
    pub fn add_counter(&mut self, dir: impl AsRef<Path>, name: &str, value: u64) {
        self.add_file(dir.as_ref().join(name), format!("{}\n", value));
    }

    /// Adds an EDAC memory controller `mc<index>` under `mc_root` with its
    /// four controller-level counters.
    ///
    /// `counts` is `[ce_count, ce_noinfo_count, ue_count, ue_noinfo_count]`.
    pub fn add_edac_controller(
        &mut self,
        mc_root: impl AsRef<Path>,
        index: u32,
        counts: [u64; 4],
    ) -> PathBuf {
        let dir = mc_root.as_ref().join(format!("mc{}", index));
        self.add_dir(&dir);
        self.add_file(dir.join("mc_name"), "Mock EDAC\n");
        let names = ["ce_count", "ce_noinfo_count", "ue_count", "ue_noinfo_count"];
        for (name, value) in names.iter().zip(counts) {
            self.add_counter(&dir, name, value);
        }
        dir
    }

    /// Adds chip-select row `csrow<index>` with `ce_count` and `ue_count`
    /// under a controller directory.
    pub fn add_edac_csrow(
        &mut self,
        controller_dir: impl AsRef<Path>,
        index: u32,
        ce_count: u64,
        ue_count: u64,
    ) -> PathBuf {
        let dir = controller_dir.as_ref().join(format!("csrow{}", index));
        self.add_dir(&dir);
        self.add_counter(&dir, "ce_count", ce_count);
        self.add_counter(&dir, "ue_count", ue_count);
        self.add_file(dir.join("size_mb"), "8192\n");
        dir
    }

    /// Loads a mock filesystem from a directory snapshot, mounted at
    /// `virtual_root` (e.g. a copy of a host's `/sys/devices/system/edac`).
    ///
    /// This is useful for regression tests with real sysfs snapshots.
    pub fn from_snapshot(dir: &Path, virtual_root: &Path) -> io::Result<Self> {
        let mut fs = Self::new();
        load_directory_recursive(&mut fs, dir, virtual_root)?;
        Ok(fs)
    }

    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

fn load_directory_recursive(
    fs: &mut MockFs,
    real_path: &Path,
    virtual_path: &Path,
) -> io::Result<()> {
    fs.add_dir(virtual_path);

    for entry in std::fs::read_dir(real_path)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let name = entry.file_name();
        let real_child = entry.path();
        let virtual_child = virtual_path.join(&name);

        if file_type.is_dir() {
            load_directory_recursive(fs, &real_child, &virtual_child)?;
        } else if file_type.is_file() {
            // Try to read as string, skip binary files
            if let Ok(content) = std::fs::read_to_string(&real_child) {
                fs.add_file(&virtual_child, content);
            }
        }
    }
    Ok(())
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let mut entries = HashSet::new();

        // Find all files and directories that are direct children
        for file_path in self.files.keys() {
            if file_path.parent().is_some_and(|parent| parent == path) {
                entries.insert(file_path.clone());
            }
        }

        for dir_path in &self.directories {
            if dir_path.parent().is_some_and(|parent| parent == path) && dir_path != path {
                entries.insert(dir_path.clone());
            }
        }

        Ok(entries.into_iter().collect())
    }
}
