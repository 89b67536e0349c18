//! EDAC (Error Detection and Correction) memory error counters.
//!
//! Walks `<sysfs>/devices/system/edac/mc/mc*` and, inside each controller,
//! `csrow*`. The number of controllers and rows is only known at scrape time.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::collector::collector::Collector;
use crate::collector::counter::{CounterSource, TextCounter};
use crate::collector::discover::{Instance, InstancePattern, discover};
use crate::collector::error::CollectError;
use crate::collector::traits::FileSystem;
use crate::config::Paths;
use crate::metric::{Desc, Metric, MetricError, MetricSink, NAMESPACE, ValueType, build_fq_name};

const EDAC_SUBSYSTEM: &str = "edac";
const MC_DIR: &str = "devices/system/edac/mc";

const CONTROLLER_LABELS: &[&str] = &["controller"];
const CSROW_LABELS: &[&str] = &["controller", "csrow"];

const CONTROLLER_IDENTITY: &str = r".*devices/system/edac/mc/mc([0-9]+)$";
const CSROW_IDENTITY: &str = r".*devices/system/edac/mc/mc([0-9]+)/csrow([0-9]+)$";

/// Counter file name paired with the family it feeds.
#[derive(Debug, Clone)]
struct CounterSpec {
    file: &'static str,
    desc: Arc<Desc>,
}

impl CounterSpec {
    fn new(
        file: &'static str,
        name: &str,
        help: &str,
        labels: &[&str],
    ) -> Result<Self, MetricError> {
        Ok(Self {
            file,
            desc: Desc::new(
                build_fq_name(NAMESPACE, EDAC_SUBSYSTEM, name),
                help,
                ValueType::Counter,
                labels,
            )?,
        })
    }
}

/// Collects correctable/uncorrectable memory error counters per controller
/// and per chip-select row.
pub struct EdacCollector<F: FileSystem + Clone> {
    fs: F,
    reader: TextCounter<F>,
    mc_root: PathBuf,
    controller_pattern: InstancePattern,
    csrow_pattern: InstancePattern,
    /// Read in this order for every controller.
    controller_counters: Vec<CounterSpec>,
    /// Read in this order for every csrow.
    csrow_counters: Vec<CounterSpec>,
}

impl<F: FileSystem + Clone> EdacCollector<F> {
    /// Creates the collector and all its descriptors.
    pub fn new(fs: F, paths: &Paths) -> Result<Self, CollectError> {
        let controller_pattern = InstancePattern::new("mc", CONTROLLER_IDENTITY, CONTROLLER_LABELS)?;
        let csrow_pattern = InstancePattern::new("csrow", CSROW_IDENTITY, CSROW_LABELS)?;

        let controller_labels = controller_pattern.labels();
        let controller_counters = vec![
            CounterSpec::new(
                "ce_count",
                "correctable_errors_total",
                "Total correctable memory errors.",
                controller_labels,
            )?,
            CounterSpec::new(
                "ce_noinfo_count",
                "no_csrow_correctable_errors_total",
                "Total correctable memory errors with no DIMM information.",
                controller_labels,
            )?,
            CounterSpec::new(
                "ue_count",
                "uncorrectable_errors_total",
                "Total uncorrectable memory errors.",
                controller_labels,
            )?,
            CounterSpec::new(
                "ue_noinfo_count",
                "no_csrow_uncorrectable_errors_total",
                "Total uncorrectable memory errors with no DIMM information.",
                controller_labels,
            )?,
        ];

        let csrow_labels = csrow_pattern.labels();
        let csrow_counters = vec![
            CounterSpec::new(
                "ce_count",
                "csrow_correctable_errors_total",
                "Total correctable memory errors for this csrow.",
                csrow_labels,
            )?,
            CounterSpec::new(
                "ue_count",
                "csrow_uncorrectable_errors_total",
                "Total uncorrectable memory errors for this csrow.",
                csrow_labels,
            )?,
        ];

        Ok(Self {
            reader: TextCounter::new(fs.clone()),
            fs,
            mc_root: paths.sys_file_path(MC_DIR),
            controller_pattern,
            csrow_pattern,
            controller_counters,
            csrow_counters,
        })
    }

    /// Runs one cycle and returns its samples.
    ///
    /// The first failure ends the cycle; nothing collected before it is
    /// returned.
    pub fn collect(&self) -> Result<Vec<Metric>, CollectError> {
        let mut samples = Vec::new();

        let controllers = discover(&self.fs, &self.mc_root, &self.controller_pattern)?;
        debug!(
            controllers = controllers.len(),
            root = %self.mc_root.display(),
            "discovered EDAC memory controllers"
        );

        for path in controllers {
            let controller = self.controller_pattern.instance(path)?;
            self.read_instance(&controller, &self.controller_counters, &mut samples)?;

            let csrows = discover(&self.fs, controller.path(), &self.csrow_pattern)?;
            trace!(controller = %controller.id(), csrows = csrows.len(), "discovered csrows");
            for path in csrows {
                let csrow = self.csrow_pattern.instance(path)?;
                self.read_instance(&csrow, &self.csrow_counters, &mut samples)?;
            }
        }

        Ok(samples)
    }

    fn read_instance(
        &self,
        instance: &Instance,
        counters: &[CounterSpec],
        samples: &mut Vec<Metric>,
    ) -> Result<(), CollectError> {
        for spec in counters {
            let value = self.reader.read_counter(instance, spec.file)?;
            samples.push(spec.desc.const_metric(value as f64, instance.id().values())?);
        }
        Ok(())
    }
}

impl<F: FileSystem + Clone> Collector for EdacCollector<F> {
    fn update(&self, out: &mut dyn MetricSink) -> Result<(), CollectError> {
        for metric in self.collect()? {
            out.emit(metric);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::mock::{EDAC_MC_ROOT, MockFs};

    fn collector(fs: MockFs) -> EdacCollector<MockFs> {
        EdacCollector::new(fs, &Paths::default()).unwrap()
    }

    fn values_of(metrics: &[Metric], name: &str) -> Vec<(Vec<String>, f64)> {
        metrics
            .iter()
            .filter(|m| m.desc().fq_name() == name)
            .map(|m| (m.label_values().to_vec(), m.value()))
            .collect()
    }

    fn labels(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_two_controllers_emit_eight_metrics() {
        let mut out: Vec<Metric> = Vec::new();
        collector(MockFs::edac_two_controllers())
            .update(&mut out)
            .unwrap();

        assert_eq!(out.len(), 8);
        assert_eq!(
            values_of(&out, "node_edac_correctable_errors_total"),
            vec![(labels(&["0"]), 5.0), (labels(&["1"]), 10.0)]
        );
        assert_eq!(
            values_of(&out, "node_edac_no_csrow_correctable_errors_total"),
            vec![(labels(&["0"]), 0.0), (labels(&["1"]), 1.0)]
        );
        assert_eq!(
            values_of(&out, "node_edac_uncorrectable_errors_total"),
            vec![(labels(&["0"]), 0.0), (labels(&["1"]), 0.0)]
        );
        assert_eq!(
            values_of(&out, "node_edac_no_csrow_uncorrectable_errors_total"),
            vec![(labels(&["0"]), 0.0), (labels(&["1"]), 0.0)]
        );
        assert!(out.iter().all(|m| m.desc().value_type() == ValueType::Counter));
        assert!(out.iter().all(|m| m.desc().label_names() == ["controller"]));
    }

    #[test]
    fn test_missing_counter_aborts_cycle() {
        let mut out: Vec<Metric> = Vec::new();
        let err = collector(MockFs::edac_missing_ce_count())
            .update(&mut out)
            .unwrap_err();

        let msg = err.to_string();
        assert!(matches!(err, CollectError::Read { .. }));
        assert!(msg.contains("ce_count"), "{}", msg);
        assert!(msg.contains("mc0"), "{}", msg);
        assert!(msg.contains("controller 0"), "{}", msg);
        assert!(out.is_empty());
    }

    #[test]
    fn test_failure_on_later_instance_emits_nothing() {
        let mut fs = MockFs::edac_two_controllers();
        fs.add_file(format!("{}/mc1/ue_noinfo_count", EDAC_MC_ROOT), "garbage\n");

        let mut out: Vec<Metric> = Vec::new();
        let err = collector(fs).update(&mut out).unwrap_err();
        assert!(err.to_string().contains("controller 1"));
        assert!(err.to_string().contains("ue_noinfo_count"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_zero_controllers_is_not_an_error() {
        let mut out: Vec<Metric> = Vec::new();
        collector(MockFs::edac_no_controllers())
            .update(&mut out)
            .unwrap();
        assert!(out.is_empty());

        // EDAC not present at all.
        collector(MockFs::new()).update(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn test_identity_mismatch_aborts_cycle() {
        let mut fs = MockFs::edac_two_controllers();
        fs.add_dir(format!("{}/mc2x", EDAC_MC_ROOT));

        let mut out: Vec<Metric> = Vec::new();
        let err = collector(fs).update(&mut out).unwrap_err();
        assert!(matches!(err, CollectError::Identity { .. }));
        assert!(err.to_string().contains("mc2x"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_csrow_metrics_carry_controller_and_csrow() {
        let out = collector(MockFs::edac_with_csrows()).collect().unwrap();

        // 4 controller counters + 2 csrows * 2 counters.
        assert_eq!(out.len(), 8);
        assert_eq!(
            values_of(&out, "node_edac_csrow_correctable_errors_total"),
            vec![(labels(&["0", "0"]), 2.0), (labels(&["0", "1"]), 1.0)]
        );
        assert_eq!(
            values_of(&out, "node_edac_csrow_uncorrectable_errors_total"),
            vec![(labels(&["0", "0"]), 1.0), (labels(&["0", "1"]), 0.0)]
        );

        for metric in out
            .iter()
            .filter(|m| m.desc().fq_name().starts_with("node_edac_csrow_"))
        {
            let names: Vec<_> = metric.labels().map(|(n, _)| n).collect();
            assert_eq!(names, ["controller", "csrow"]);
        }
    }

    #[test]
    fn test_csrow_read_failure_names_csrow() {
        let mut fs = MockFs::edac_with_csrows();
        fs.remove_file(format!("{}/mc0/csrow1/ue_count", EDAC_MC_ROOT));

        let err = collector(fs).collect().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("controller 0, csrow 1"), "{}", msg);
        assert!(msg.contains("ue_count"), "{}", msg);
    }

    #[test]
    fn test_emitted_count_matches_discovered_instances() {
        for n in 0..6u32 {
            let mut fs = MockFs::new();
            fs.add_dir(EDAC_MC_ROOT);
            for i in 0..n {
                fs.add_edac_controller(EDAC_MC_ROOT, i, [i as u64, 0, 0, 0]);
            }
            let out = collector(fs).collect().unwrap();
            assert_eq!(
                values_of(&out, "node_edac_correctable_errors_total").len(),
                n as usize
            );
            assert_eq!(out.len(), 4 * n as usize);
        }
    }

    #[test]
    fn test_custom_sysfs_root() {
        let mut fs = MockFs::new();
        fs.add_edac_controller("/host/sys/devices/system/edac/mc", 4, [1, 1, 1, 1]);

        let edac = EdacCollector::new(fs, &Paths::new("/host/sys", "/host/proc")).unwrap();
        let out = edac.collect().unwrap();
        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|m| m.label("controller") == Some("4")));
    }
}
