//! Collector contract and the registry that drives all enabled collectors.
//!
//! Each collector implements [`Collector::update`], called once per scrape.
//! [`CollectorRegistry`] builds collectors by name from the [`factories`]
//! table, runs them concurrently (one thread per collector) and reports the
//! health of every collector as its own metrics.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::collector::edac::EdacCollector;
use crate::collector::error::CollectError;
use crate::collector::stat::StatCollector;
use crate::collector::traits::FileSystem;
use crate::config::Paths;
use crate::metric::{Desc, Metric, MetricSink, NAMESPACE, ValueType, build_fq_name};

/// A unit producing one family of related metrics per scrape.
///
/// `update` runs sequentially and either emits the full set of samples for
/// the cycle or returns an error without emitting anything.
pub trait Collector: Send + Sync {
    fn update(&self, out: &mut dyn MetricSink) -> Result<(), CollectError>;
}

/// Constructor stored in the factory table.
pub type Factory<F> = fn(F, &Paths) -> Result<Box<dyn Collector>, CollectError>;

fn new_edac<F: FileSystem + Clone + 'static>(
    fs: F,
    paths: &Paths,
) -> Result<Box<dyn Collector>, CollectError> {
    Ok(Box::new(EdacCollector::new(fs, paths)?))
}

fn new_stat<F: FileSystem + Clone + 'static>(
    fs: F,
    paths: &Paths,
) -> Result<Box<dyn Collector>, CollectError> {
    Ok(Box::new(StatCollector::native(fs, paths)?))
}

/// Name to constructor mapping of every available collector.
pub fn factories<F: FileSystem + Clone + 'static>() -> BTreeMap<&'static str, Factory<F>> {
    let mut table: BTreeMap<&'static str, Factory<F>> = BTreeMap::new();
    table.insert("edac", new_edac::<F>);
    table.insert("stat", new_stat::<F>);
    table
}

/// Result of one collector within a scrape.
#[derive(Debug, Clone)]
pub struct CollectorOutcome {
    pub name: String,
    pub duration: Duration,
    /// Number of samples the collector emitted.
    pub samples: usize,
    /// Error message if the cycle failed.
    pub error: Option<String>,
}

impl CollectorOutcome {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-collector results of one scrape.
#[derive(Debug, Clone, Default)]
pub struct ScrapeSummary {
    pub collectors: Vec<CollectorOutcome>,
}

impl ScrapeSummary {
    /// Total samples emitted by collectors (scrape metrics excluded).
    pub fn samples(&self) -> usize {
        self.collectors.iter().map(|c| c.samples).sum()
    }

    pub fn failed(&self) -> impl Iterator<Item = &CollectorOutcome> {
        self.collectors.iter().filter(|c| !c.success())
    }
}

/// Set of enabled collectors.
pub struct CollectorRegistry {
    collectors: Vec<(String, Box<dyn Collector>)>,
    scrape_duration: Arc<Desc>,
    scrape_success: Arc<Desc>,
}

impl CollectorRegistry {
    /// Creates a registry from already-built collectors.
    pub fn new(collectors: Vec<(String, Box<dyn Collector>)>) -> Result<Self, CollectError> {
        let scrape_duration = Desc::new(
            build_fq_name(NAMESPACE, "scrape", "collector_duration_seconds"),
            "Duration of a collector scrape.",
            ValueType::Gauge,
            &["collector"],
        )?;
        let scrape_success = Desc::new(
            build_fq_name(NAMESPACE, "scrape", "collector_success"),
            "Whether a collector succeeded.",
            ValueType::Gauge,
            &["collector"],
        )?;
        Ok(Self {
            collectors,
            scrape_duration,
            scrape_success,
        })
    }

    /// Builds the named collectors through [`factories`].
    ///
    /// Unknown names and failing constructors are errors.
    pub fn from_names<F, S>(names: &[S], fs: F, paths: &Paths) -> Result<Self, CollectError>
    where
        F: FileSystem + Clone + 'static,
        S: AsRef<str>,
    {
        let table = factories::<F>();
        let mut collectors: Vec<(String, Box<dyn Collector>)> = Vec::with_capacity(names.len());

        for name in names {
            let name = name.as_ref();
            if collectors.iter().any(|(n, _)| n == name) {
                continue;
            }
            let factory = table
                .get(name)
                .ok_or_else(|| CollectError::UnknownCollector(name.to_string()))?;
            collectors.push((name.to_string(), factory(fs.clone(), paths)?));
            debug!(collector = name, "collector enabled");
        }

        Self::new(collectors)
    }

    /// Names of the enabled collectors, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collectors.iter().map(|(n, _)| n.as_str())
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    /// Runs every collector once and forwards the samples to `out`.
    ///
    /// Collectors run on separate threads, each with its own buffer, so one
    /// failing collector never affects the others. After the collectors'
    /// samples, two gauges per collector report its duration and success.
    pub fn scrape(&self, out: &mut dyn MetricSink) -> ScrapeSummary {
        let results: Vec<(&str, Duration, Result<Vec<Metric>, CollectError>)> =
            std::thread::scope(|scope| {
                let handles: Vec<_> = self
                    .collectors
                    .iter()
                    .map(|(name, collector)| {
                        let handle = scope.spawn(move || {
                            let start = Instant::now();
                            let mut buf: Vec<Metric> = Vec::new();
                            let result = collector.update(&mut buf).map(|()| buf);
                            (start.elapsed(), result)
                        });
                        (name.as_str(), handle)
                    })
                    .collect();

                handles
                    .into_iter()
                    .map(|(name, handle)| match handle.join() {
                        Ok((duration, result)) => (name, duration, result),
                        Err(_) => (
                            name,
                            Duration::ZERO,
                            Err(CollectError::Panicked(name.to_string())),
                        ),
                    })
                    .collect()
            });

        let mut summary = ScrapeSummary::default();
        for (name, duration, result) in results {
            let (samples, error) = match result {
                Ok(metrics) => {
                    let count = metrics.len();
                    for metric in metrics {
                        out.emit(metric);
                    }
                    debug!(collector = name, samples = count, ?duration, "collector succeeded");
                    (count, None)
                }
                Err(e) => {
                    warn!(collector = name, ?duration, error = %e, "collector failed");
                    (0, Some(e.to_string()))
                }
            };

            let success = if error.is_none() { 1.0 } else { 0.0 };
            if let Ok(m) = self
                .scrape_duration
                .const_metric(duration.as_secs_f64(), &[name])
            {
                out.emit(m);
            }
            if let Ok(m) = self.scrape_success.const_metric(success, &[name]) {
                out.emit(m);
            }

            summary.collectors.push(CollectorOutcome {
                name: name.to_string(),
                duration,
                samples,
                error,
            });
        }

        summary
    }
}
