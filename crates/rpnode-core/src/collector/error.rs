//! Error type for collection failures.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use crate::collector::discover::Instance;
use crate::metric::MetricError;

/// Every variant aborts the current collector's cycle.
#[derive(Debug)]
pub enum CollectError {
    /// Instance tree could not be enumerated.
    Discovery { path: PathBuf, source: io::Error },
    /// Discovered path does not match the expected naming pattern.
    Identity { path: PathBuf },
    /// Identity pattern failed to compile or does not fit its label set.
    Pattern(String),
    /// Counter could not be read or parsed.
    Read {
        instance: String,
        counter: String,
        path: PathBuf,
        reason: String,
    },
    /// System information query failed.
    Query { key: String, source: io::Error },
    /// Raw query result does not fit the expected layout.
    Decode { key: String, reason: String },
    /// Invalid metric descriptor or sample.
    Descriptor(MetricError),
    /// Collector name not present in the factory table.
    UnknownCollector(String),
    /// Collector thread panicked during a scrape.
    Panicked(String),
}

impl CollectError {
    pub(crate) fn read(
        instance: &Instance,
        counter: &str,
        path: &Path,
        reason: impl Into<String>,
    ) -> Self {
        CollectError::Read {
            instance: instance.id().to_string(),
            counter: counter.to_string(),
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CollectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectError::Discovery { path, source } => {
                write!(f, "couldn't enumerate {}: {}", path.display(), source)
            }
            CollectError::Identity { path } => write!(
                f,
                "instance path didn't match naming pattern: {}",
                path.display()
            ),
            CollectError::Pattern(msg) => write!(f, "invalid instance pattern: {}", msg),
            CollectError::Read {
                instance,
                counter,
                path,
                reason,
            } => write!(
                f,
                "couldn't get {} for {} ({}): {}",
                counter,
                instance,
                path.display(),
                reason
            ),
            CollectError::Query { key, source } => write!(f, "couldn't query {}: {}", key, source),
            CollectError::Decode { key, reason } => {
                write!(f, "couldn't decode {}: {}", key, reason)
            }
            CollectError::Descriptor(e) => write!(f, "metric error: {}", e),
            CollectError::UnknownCollector(name) => write!(f, "unknown collector {:?}", name),
            CollectError::Panicked(name) => write!(f, "collector {} panicked", name),
        }
    }
}

impl std::error::Error for CollectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectError::Discovery { source, .. } | CollectError::Query { source, .. } => {
                Some(source)
            }
            CollectError::Descriptor(e) => Some(e),
            _ => None,
        }
    }
}

impl From<MetricError> for CollectError {
    fn from(e: MetricError) -> Self {
        CollectError::Descriptor(e)
    }
}

impl From<regex::Error> for CollectError {
    fn from(e: regex::Error) -> Self {
        CollectError::Pattern(e.to_string())
    }
}
