//! Kernel statistics: node boot time.
//!
//! A single fixed counter with no discovery step. The value comes from
//! `kern.boottime` on BSD-family systems and from the `btime` line of
//! `/proc/stat` on Linux.

use std::sync::Arc;

use crate::collector::collector::Collector;
use crate::collector::counter::{CounterSource, KeyedTextCounter, RawCounter};
use crate::collector::discover::Instance;
use crate::collector::error::CollectError;
use crate::collector::layout::TIMEVAL_SEC;
use crate::collector::traits::{FileSystem, Sysctl};
use crate::config::Paths;
use crate::metric::{Desc, Metric, MetricSink, NAMESPACE, ValueType, build_fq_name};

/// sysctl OID holding a `struct timeval`.
const BOOTTIME_SYSCTL: &str = "kern.boottime";
/// Key of the boot time line in `/proc/stat`.
const BOOTTIME_PROC_KEY: &str = "btime";

/// Exposes `node_boot_time`.
pub struct StatCollector {
    btime: Arc<Desc>,
    reader: Box<dyn CounterSource>,
    source: Instance,
    key: &'static str,
}

impl StatCollector {
    fn with_reader(
        reader: Box<dyn CounterSource>,
        source: Instance,
        key: &'static str,
    ) -> Result<Self, CollectError> {
        let btime = Desc::new(
            build_fq_name(NAMESPACE, "", "boot_time"),
            "Node boot time, in unixtime.",
            ValueType::Gauge,
            &[],
        )?;
        Ok(Self {
            btime,
            reader,
            source,
            key,
        })
    }

    /// Boot time from the raw `kern.boottime` structure.
    pub fn from_sysctl<S: Sysctl + 'static>(sysctl: S) -> Result<Self, CollectError> {
        Self::with_reader(
            Box::new(RawCounter::new(sysctl, TIMEVAL_SEC)),
            Instance::system(""),
            BOOTTIME_SYSCTL,
        )
    }

    /// Boot time from `<procfs>/stat`.
    pub fn from_proc_stat<F: FileSystem + 'static>(
        fs: F,
        paths: &Paths,
    ) -> Result<Self, CollectError> {
        Self::with_reader(
            Box::new(KeyedTextCounter::new(fs)),
            Instance::system(paths.proc_file_path("stat")),
            BOOTTIME_PROC_KEY,
        )
    }

    /// Picks the source native to the build target.
    #[cfg(any(
        target_os = "freebsd",
        target_os = "dragonfly",
        target_os = "macos",
        target_os = "ios"
    ))]
    pub fn native<F: FileSystem + 'static>(_fs: F, _paths: &Paths) -> Result<Self, CollectError> {
        Self::from_sysctl(crate::collector::traits::RealSysctl::new())
    }

    /// Picks the source native to the build target.
    #[cfg(not(any(
        target_os = "freebsd",
        target_os = "dragonfly",
        target_os = "macos",
        target_os = "ios"
    )))]
    pub fn native<F: FileSystem + 'static>(fs: F, paths: &Paths) -> Result<Self, CollectError> {
        Self::from_proc_stat(fs, paths)
    }

    /// Reads the boot time and returns the single gauge sample.
    pub fn collect(&self) -> Result<Metric, CollectError> {
        let value = self.reader.read_counter(&self.source, self.key)?;
        let no_labels: &[&str] = &[];
        Ok(self.btime.const_metric(value as f64, no_labels)?)
    }
}

impl Collector for StatCollector {
    fn update(&self, out: &mut dyn MetricSink) -> Result<(), CollectError> {
        out.emit(self.collect()?);
        Ok(())
    }
}
