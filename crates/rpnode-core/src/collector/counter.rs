//! Counter readers: one capability, several OS access strategies.
//!
//! | strategy            | source                                   |
//! |---------------------|------------------------------------------|
//! | [`TextCounter`]     | `<instance>/<counter>` single-value file |
//! | [`KeyedTextCounter`]| `<counter> <value>` line in the instance file |
//! | [`RawCounter`]      | fixed-offset field of a sysctl buffer    |

use crate::collector::discover::Instance;
use crate::collector::error::CollectError;
use crate::collector::layout::FieldLayout;
use crate::collector::procfs::{parse_keyed_counter, parse_uint_counter};
use crate::collector::traits::{FileSystem, Sysctl};

/// Reads the current value of one counter of one instance.
///
/// Reads are independent: a failure leaves other instances and counters
/// untouched, and the error names the instance and the counter.
pub trait CounterSource: Send + Sync {
    fn read_counter(&self, instance: &Instance, counter: &str) -> Result<u64, CollectError>;
}

/// Single-value text file under the instance directory.
#[derive(Debug, Clone)]
pub struct TextCounter<F: FileSystem> {
    fs: F,
}

impl<F: FileSystem> TextCounter<F> {
    pub fn new(fs: F) -> Self {
        Self { fs }
    }
}

impl<F: FileSystem> CounterSource for TextCounter<F> {
    fn read_counter(&self, instance: &Instance, counter: &str) -> Result<u64, CollectError> {
        let path = instance.path().join(counter);
        let content = self
            .fs
            .read_to_string(&path)
            .map_err(|e| CollectError::read(instance, counter, &path, e.to_string()))?;
        parse_uint_counter(&content)
            .map_err(|e| CollectError::read(instance, counter, &path, e.message))
    }
}

/// `key value` line of the file at the instance path.
#[derive(Debug, Clone)]
pub struct KeyedTextCounter<F: FileSystem> {
    fs: F,
}

impl<F: FileSystem> KeyedTextCounter<F> {
    pub fn new(fs: F) -> Self {
        Self { fs }
    }
}

impl<F: FileSystem> CounterSource for KeyedTextCounter<F> {
    fn read_counter(&self, instance: &Instance, counter: &str) -> Result<u64, CollectError> {
        let path = instance.path();
        let content = self
            .fs
            .read_to_string(path)
            .map_err(|e| CollectError::read(instance, counter, path, e.to_string()))?;
        parse_keyed_counter(&content, counter)
            .map_err(|e| CollectError::read(instance, counter, path, e.message))
    }
}

/// Field of a raw system query buffer; `counter` is the query key.
#[derive(Debug, Clone)]
pub struct RawCounter<S: Sysctl> {
    sysctl: S,
    layout: FieldLayout,
}

impl<S: Sysctl> RawCounter<S> {
    pub fn new(sysctl: S, layout: FieldLayout) -> Self {
        Self { sysctl, layout }
    }
}

impl<S: Sysctl> CounterSource for RawCounter<S> {
    fn read_counter(&self, _instance: &Instance, counter: &str) -> Result<u64, CollectError> {
        let buf = self
            .sysctl
            .sysctl_raw(counter)
            .map_err(|source| CollectError::Query {
                key: counter.to_string(),
                source,
            })?;
        self.layout
            .decode(&buf)
            .map_err(|e| CollectError::Decode {
                key: counter.to_string(),
                reason: e.to_string(),
            })
    }
}
