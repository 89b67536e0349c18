//! Typed metric model: descriptors, samples and the sink they are emitted to.
//!
//! A [`Desc`] is built once when a collector is constructed and shared by every
//! cycle afterwards. Samples ([`Metric`]) can only be produced through
//! [`Desc::const_metric`], which checks that the label values line up with the
//! descriptor's label names.

use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{Sender, SyncSender};

use serde::Serialize;

/// Namespace prefix shared by every metric this crate exposes.
pub const NAMESPACE: &str = "node";

/// Value semantics of a metric family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Monotonically non-decreasing value.
    Counter,
    /// Point-in-time value.
    Gauge,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Counter => "counter",
            ValueType::Gauge => "gauge",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error raised when a descriptor or a sample is malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    /// Fully-qualified metric name is empty or contains invalid characters.
    InvalidName(String),
    /// Label name is invalid or uses the reserved `__` prefix.
    InvalidLabelName { metric: String, label: String },
    /// The same label name appears twice in one descriptor.
    DuplicateLabel { metric: String, label: String },
    /// Help text is empty.
    EmptyHelp(String),
    /// Number of label values differs from the number of label names.
    LabelCardinality {
        metric: String,
        expected: usize,
        got: usize,
    },
}

impl fmt::Display for MetricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetricError::InvalidName(name) => write!(f, "invalid metric name {:?}", name),
            MetricError::InvalidLabelName { metric, label } => {
                write!(f, "invalid label name {:?} for metric {}", label, metric)
            }
            MetricError::DuplicateLabel { metric, label } => {
                write!(f, "duplicate label name {:?} for metric {}", label, metric)
            }
            MetricError::EmptyHelp(name) => write!(f, "empty help text for metric {}", name),
            MetricError::LabelCardinality {
                metric,
                expected,
                got,
            } => write!(
                f,
                "metric {} expects {} label values, got {}",
                metric, expected, got
            ),
        }
    }
}

impl std::error::Error for MetricError {}

/// Joins namespace, subsystem and name with `_`, skipping empty parts.
///
/// `build_fq_name("node", "edac", "ue_count")` gives `node_edac_ue_count`,
/// `build_fq_name("node", "", "boot_time")` gives `node_boot_time`.
pub fn build_fq_name(namespace: &str, subsystem: &str, name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    [namespace, subsystem, name]
        .iter()
        .filter(|part| !part.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("_")
}

fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

fn is_valid_label_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    !name.starts_with("__") && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Immutable definition of one metric family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Desc {
    fq_name: String,
    help: String,
    value_type: ValueType,
    label_names: Vec<String>,
}

impl Desc {
    /// Builds and validates a descriptor.
    pub fn new(
        fq_name: impl Into<String>,
        help: impl Into<String>,
        value_type: ValueType,
        label_names: &[&str],
    ) -> Result<Arc<Self>, MetricError> {
        let fq_name = fq_name.into();
        let help = help.into();

        if !is_valid_metric_name(&fq_name) {
            return Err(MetricError::InvalidName(fq_name));
        }
        if help.trim().is_empty() {
            return Err(MetricError::EmptyHelp(fq_name));
        }

        let mut names: Vec<String> = Vec::with_capacity(label_names.len());
        for label in label_names {
            if !is_valid_label_name(label) {
                return Err(MetricError::InvalidLabelName {
                    metric: fq_name,
                    label: label.to_string(),
                });
            }
            if names.iter().any(|n| n == label) {
                return Err(MetricError::DuplicateLabel {
                    metric: fq_name,
                    label: label.to_string(),
                });
            }
            names.push(label.to_string());
        }

        Ok(Arc::new(Self {
            fq_name,
            help,
            value_type,
            label_names: names,
        }))
    }

    pub fn fq_name(&self) -> &str {
        &self.fq_name
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// Creates one sample of this family.
    ///
    /// `label_values` must follow the order of [`Desc::label_names`].
    pub fn const_metric<S: AsRef<str>>(
        self: &Arc<Self>,
        value: f64,
        label_values: &[S],
    ) -> Result<Metric, MetricError> {
        if label_values.len() != self.label_names.len() {
            return Err(MetricError::LabelCardinality {
                metric: self.fq_name.clone(),
                expected: self.label_names.len(),
                got: label_values.len(),
            });
        }

        Ok(Metric {
            desc: Arc::clone(self),
            value,
            label_values: label_values
                .iter()
                .map(|v| v.as_ref().to_string())
                .collect(),
        })
    }
}

/// One metric sample produced during a collection cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Metric {
    desc: Arc<Desc>,
    value: f64,
    label_values: Vec<String>,
}

impl Metric {
    pub fn desc(&self) -> &Desc {
        &self.desc
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn label_values(&self) -> &[String] {
        &self.label_values
    }

    /// Label name/value pairs in descriptor order.
    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.desc
            .label_names
            .iter()
            .map(String::as_str)
            .zip(self.label_values.iter().map(String::as_str))
    }

    /// Returns the value of a single label, if the family declares it.
    pub fn label(&self, name: &str) -> Option<&str> {
        self.labels().find(|(n, _)| *n == name).map(|(_, v)| v)
    }
}

/// Destination for emitted samples, supplied by the caller for one update.
///
/// Emission is fire-and-forget: sinks that can fail (closed channels) drop the
/// sample silently, delivery semantics belong to the caller.
pub trait MetricSink {
    fn emit(&mut self, metric: Metric);
}

impl MetricSink for Vec<Metric> {
    fn emit(&mut self, metric: Metric) {
        self.push(metric);
    }
}

impl MetricSink for Sender<Metric> {
    fn emit(&mut self, metric: Metric) {
        let _ = self.send(metric);
    }
}

impl MetricSink for SyncSender<Metric> {
    fn emit(&mut self, metric: Metric) {
        let _ = self.send(metric);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_build_fq_name() {
        assert_eq!(
            build_fq_name("node", "edac", "correctable_errors_total"),
            "node_edac_correctable_errors_total"
        );
        assert_eq!(build_fq_name("node", "", "boot_time"), "node_boot_time");
        assert_eq!(build_fq_name("", "", "up"), "up");
        assert_eq!(build_fq_name("node", "edac", ""), "");
    }

    #[test]
    fn test_desc_rejects_invalid_names() {
        assert_eq!(
            Desc::new("", "help", ValueType::Gauge, &[]).unwrap_err(),
            MetricError::InvalidName(String::new())
        );
        assert!(matches!(
            Desc::new("1abc", "help", ValueType::Gauge, &[]),
            Err(MetricError::InvalidName(_))
        ));
        assert!(matches!(
            Desc::new("node_x", "help", ValueType::Gauge, &["__reserved"]),
            Err(MetricError::InvalidLabelName { .. })
        ));
        assert!(matches!(
            Desc::new("node_x", "help", ValueType::Gauge, &["bad-label"]),
            Err(MetricError::InvalidLabelName { .. })
        ));
        assert!(matches!(
            Desc::new("node_x", "help", ValueType::Gauge, &["a", "a"]),
            Err(MetricError::DuplicateLabel { .. })
        ));
        assert!(matches!(
            Desc::new("node_x", "  ", ValueType::Gauge, &[]),
            Err(MetricError::EmptyHelp(_))
        ));
    }

    #[test]
    fn test_const_metric_checks_label_cardinality() {
        let desc = Desc::new(
            "node_edac_csrow_correctable_errors_total",
            "Total correctable memory errors for this csrow.",
            ValueType::Counter,
            &["controller", "csrow"],
        )
        .unwrap();

        let err = desc.const_metric(1.0, &["0"]).unwrap_err();
        assert_eq!(
            err,
            MetricError::LabelCardinality {
                metric: "node_edac_csrow_correctable_errors_total".to_string(),
                expected: 2,
                got: 1,
            }
        );

        let metric = desc.const_metric(7.0, &["0", "3"]).unwrap();
        let labels: Vec<_> = metric.labels().collect();
        assert_eq!(labels, vec![("controller", "0"), ("csrow", "3")]);
        assert_eq!(metric.label("csrow"), Some("3"));
        assert_eq!(metric.label("missing"), None);
        assert_eq!(metric.value(), 7.0);
    }

    #[test]
    fn test_sinks() {
        let desc = Desc::new("node_boot_time", "Node boot time.", ValueType::Gauge, &[]).unwrap();
        let no_labels: &[&str] = &[];

        let mut buf: Vec<Metric> = Vec::new();
        buf.emit(desc.const_metric(1.0, no_labels).unwrap());
        assert_eq!(buf.len(), 1);

        let (mut tx, rx) = mpsc::channel();
        tx.emit(desc.const_metric(2.0, no_labels).unwrap());
        assert_eq!(rx.recv().unwrap().value(), 2.0);

        // A closed channel does not panic.
        drop(rx);
        tx.emit(desc.const_metric(3.0, no_labels).unwrap());
    }
}
