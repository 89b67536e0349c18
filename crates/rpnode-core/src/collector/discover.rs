//! Instance discovery for hardware trees of unknown size.
//!
//! One topology level (e.g. `mc[0-9]*` under `devices/system/edac/mc`) is an
//! [`InstancePattern`]: a directory-entry prefix that must be followed by a
//! digit, plus an identity regex applied to the full path. The identity regex
//! and the label names it feeds are fixed together, so every [`InstanceId`]
//! lines up with the descriptors built from [`InstancePattern::labels`].

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::collector::error::CollectError;
use crate::collector::traits::FileSystem;

/// Identity of one discovered instance: label names with parsed values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstanceId {
    labels: &'static [&'static str],
    values: Vec<String>,
}

impl InstanceId {
    /// Identity of a source with no topology (single fixed counter).
    pub fn system() -> Self {
        Self {
            labels: &[],
            values: Vec::new(),
        }
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }

    /// Label values, in label-name order.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn get(&self, label: &str) -> Option<&str> {
        self.labels
            .iter()
            .position(|l| *l == label)
            .map(|i| self.values[i].as_str())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.values.is_empty() {
            return f.write_str("system");
        }
        for (i, (label, value)) in self.labels.iter().zip(&self.values).enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} {}", label, value)?;
        }
        Ok(())
    }
}

/// A discovered instance: where it lives and who it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    id: InstanceId,
    path: PathBuf,
}

impl Instance {
    pub fn new(id: InstanceId, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }

    /// Unlabeled instance rooted at `path`.
    pub fn system(path: impl Into<PathBuf>) -> Self {
        Self::new(InstanceId::system(), path)
    }

    pub fn id(&self) -> &InstanceId {
        &self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Matching rule for one topology level.
#[derive(Debug, Clone)]
pub struct InstancePattern {
    prefix: &'static str,
    identity: Regex,
    labels: &'static [&'static str],
}

impl InstancePattern {
    /// Builds a pattern.
    ///
    /// # Arguments
    /// * `prefix` - entry name prefix; the entry must continue with a digit
    /// * `identity` - regex over the full path, one capture group per label
    /// * `labels` - label names fed by the capture groups, in order
    pub fn new(
        prefix: &'static str,
        identity: &str,
        labels: &'static [&'static str],
    ) -> Result<Self, CollectError> {
        let identity = Regex::new(identity)?;
        let groups = identity.captures_len() - 1;
        if groups != labels.len() {
            return Err(CollectError::Pattern(format!(
                "{} has {} capture groups for {} labels",
                identity.as_str(),
                groups,
                labels.len()
            )));
        }
        Ok(Self {
            prefix,
            identity,
            labels,
        })
    }

    pub fn labels(&self) -> &'static [&'static str] {
        self.labels
    }

    /// Glob-style name filter equivalent to `<prefix>[0-9]*`.
    pub fn matches_name(&self, name: &str) -> bool {
        name.strip_prefix(self.prefix)
            .and_then(|rest| rest.chars().next())
            .is_some_and(|c| c.is_ascii_digit())
    }

    /// Extracts the identity tuple from a discovered path.
    ///
    /// Fails if the path does not match the identity regex: discovery and
    /// naming are expected to agree, a mismatch means the OS interface
    /// changed shape.
    pub fn identity_of(&self, path: &Path) -> Result<InstanceId, CollectError> {
        let mismatch = || CollectError::Identity {
            path: path.to_path_buf(),
        };

        let text = path.to_str().ok_or_else(mismatch)?;
        let caps = self.identity.captures(text).ok_or_else(mismatch)?;
        let values = caps
            .iter()
            .skip(1)
            .map(|m| m.map(|m| m.as_str().to_string()).ok_or_else(mismatch))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(InstanceId {
            labels: self.labels,
            values,
        })
    }

    /// Pairs a discovered path with its identity.
    pub fn instance(&self, path: PathBuf) -> Result<Instance, CollectError> {
        let id = self.identity_of(&path)?;
        Ok(Instance { id, path })
    }
}

/// Lists the entries of `dir` accepted by `pattern`.
///
/// One `read_dir` call, so all results come from the same snapshot. A missing
/// `dir` means the feature is absent and yields no instances. Results are
/// sorted by path; callers must not read numeric order into them
/// (`mc10` sorts before `mc2`).
pub fn discover<F: FileSystem + ?Sized>(
    fs: &F,
    dir: &Path,
    pattern: &InstancePattern,
) -> Result<Vec<PathBuf>, CollectError> {
    let entries = match fs.read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(CollectError::Discovery {
                path: dir.to_path_buf(),
                source,
            });
        }
    };

    let mut matches: Vec<PathBuf> = entries
        .into_iter()
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| pattern.matches_name(n))
        })
        .collect();
    matches.sort();
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::MockFs;

    const MC_LABELS: &[&str] = &["controller"];
    const CSROW_LABELS: &[&str] = &["controller", "csrow"];

    fn controller_pattern() -> InstancePattern {
        InstancePattern::new("mc", r".*devices/system/edac/mc/mc([0-9]+)$", MC_LABELS).unwrap()
    }

    fn csrow_pattern() -> InstancePattern {
        InstancePattern::new(
            "csrow",
            r".*devices/system/edac/mc/mc([0-9]+)/csrow([0-9]+)$",
            CSROW_LABELS,
        )
        .unwrap()
    }

    struct DeniedFs;

    impl FileSystem for DeniedFs {
        fn read_to_string(&self, _path: &Path) -> io::Result<String> {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        }

        fn exists(&self, _path: &Path) -> bool {
            true
        }

        fn read_dir(&self, _path: &Path) -> io::Result<Vec<PathBuf>> {
            Err(io::Error::from(io::ErrorKind::PermissionDenied))
        }
    }

    #[test]
    fn test_pattern_group_count_must_match_labels() {
        let err = InstancePattern::new("mc", r"mc([0-9]+)/csrow([0-9]+)", MC_LABELS).unwrap_err();
        assert!(matches!(err, CollectError::Pattern(_)));

        let err = InstancePattern::new("mc", r"mc([0-9+", MC_LABELS).unwrap_err();
        assert!(matches!(err, CollectError::Pattern(_)));
    }

    #[test]
    fn test_matches_name() {
        let pattern = controller_pattern();
        assert!(pattern.matches_name("mc0"));
        assert!(pattern.matches_name("mc12"));
        assert!(pattern.matches_name("mc1x"));
        assert!(!pattern.matches_name("mc"));
        assert!(!pattern.matches_name("mc_name"));
        assert!(!pattern.matches_name("power"));
        assert!(!pattern.matches_name("xmc0"));
    }

    #[test]
    fn test_identity_is_deterministic() {
        let pattern = controller_pattern();
        let path = Path::new("/sys/devices/system/edac/mc/mc3");

        let first = pattern.identity_of(path).unwrap();
        let second = pattern.identity_of(path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.values(), ["3"]);
        assert_eq!(first.get("controller"), Some("3"));
        assert_eq!(first.to_string(), "controller 3");
    }

    #[test]
    fn test_identity_carries_parent() {
        let id = csrow_pattern()
            .identity_of(Path::new("/sys/devices/system/edac/mc/mc1/csrow7"))
            .unwrap();
        assert_eq!(id.labels(), CSROW_LABELS);
        assert_eq!(id.values(), ["1", "7"]);
        assert_eq!(id.to_string(), "controller 1, csrow 7");
    }

    #[test]
    fn test_identity_mismatch_is_error() {
        let pattern = controller_pattern();
        let err = pattern
            .identity_of(Path::new("/sys/devices/system/edac/mc/mc1x"))
            .unwrap_err();
        assert!(matches!(err, CollectError::Identity { .. }));
        assert!(err.to_string().contains("mc1x"));
    }

    #[test]
    fn test_system_identity() {
        let instance = Instance::system("/proc/stat");
        assert_eq!(instance.id().to_string(), "system");
        assert!(instance.id().values().is_empty());
        assert_eq!(instance.path(), Path::new("/proc/stat"));
    }

    #[test]
    fn test_discover_filters_and_sorts() {
        let mut fs = MockFs::new();
        fs.add_dir("/sys/devices/system/edac/mc/mc1");
        fs.add_dir("/sys/devices/system/edac/mc/mc0");
        fs.add_dir("/sys/devices/system/edac/mc/power");
        fs.add_file("/sys/devices/system/edac/mc/uevent", "");

        let found = discover(
            &fs,
            Path::new("/sys/devices/system/edac/mc"),
            &controller_pattern(),
        )
        .unwrap();
        assert_eq!(
            found,
            vec![
                PathBuf::from("/sys/devices/system/edac/mc/mc0"),
                PathBuf::from("/sys/devices/system/edac/mc/mc1"),
            ]
        );
    }

    #[test]
    fn test_discover_missing_root_is_empty() {
        let fs = MockFs::new();
        let found = discover(
            &fs,
            Path::new("/sys/devices/system/edac/mc"),
            &controller_pattern(),
        )
        .unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_discover_io_error() {
        let err = discover(
            &DeniedFs,
            Path::new("/sys/devices/system/edac/mc"),
            &controller_pattern(),
        )
        .unwrap_err();
        assert!(matches!(err, CollectError::Discovery { .. }));
        assert!(err.to_string().contains("/sys/devices/system/edac/mc"));
    }
}
