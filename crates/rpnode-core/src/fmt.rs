//! Text rendering of metric samples.
//!
//! Produces the familiar `name{label="value"} value` line format with
//! `# HELP` / `# TYPE` headers, one header block per family in order of first
//! appearance.

use std::fmt::Write;

use crate::metric::Metric;

/// Escapes a label value: backslash, double quote and newline.
fn escape_label_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out
}

/// Escapes help text: backslash and newline.
fn escape_help(help: &str) -> String {
    help.replace('\\', "\\\\").replace('\n', "\\n")
}

/// Formats a sample value; integral values print without a fraction.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let inf = if value > 0.0 { "+Inf" } else { "-Inf" };
        inf.to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// Renders samples as text, grouping families by name.
pub fn render_text(metrics: &[Metric]) -> String {
    let mut families: Vec<&str> = Vec::new();
    for metric in metrics {
        let name = metric.desc().fq_name();
        if !families.contains(&name) {
            families.push(name);
        }
    }

    let mut out = String::new();
    for family in families {
        let mut samples = metrics.iter().filter(|m| m.desc().fq_name() == family);
        let Some(first) = samples.next() else {
            continue;
        };
        let desc = first.desc();
        let _ = writeln!(out, "# HELP {} {}", family, escape_help(desc.help()));
        let _ = writeln!(out, "# TYPE {} {}", family, desc.value_type());

        for metric in std::iter::once(first).chain(samples) {
            out.push_str(family);
            let labels: Vec<String> = metric
                .labels()
                .map(|(k, v)| format!("{}=\"{}\"", k, escape_label_value(v)))
                .collect();
            if !labels.is_empty() {
                let _ = write!(out, "{{{}}}", labels.join(","));
            }
            let _ = writeln!(out, " {}", format_value(metric.value()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metric::{Desc, ValueType};

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(5.0), "5");
        assert_eq!(format_value(1_700_000_000.0), "1700000000");
        assert_eq!(format_value(0.25), "0.25");
        assert_eq!(format_value(f64::NAN), "NaN");
        assert_eq!(format_value(f64::INFINITY), "+Inf");
    }

    #[test]
    fn test_render_text_groups_families() {
        let ce = Desc::new(
            "node_edac_correctable_errors_total",
            "Total correctable memory errors.",
            ValueType::Counter,
            &["controller"],
        )
        .unwrap();
        let btime = Desc::new(
            "node_boot_time",
            "Node boot time, in unixtime.",
            ValueType::Gauge,
            &[],
        )
        .unwrap();
        let no_labels: &[&str] = &[];

        let metrics = vec![
            ce.const_metric(5.0, &["0"]).unwrap(),
            btime.const_metric(1_700_000_000.0, no_labels).unwrap(),
            ce.const_metric(10.0, &["1"]).unwrap(),
        ];

        let text = render_text(&metrics);
        assert_eq!(
            text,
            "\
# HELP node_edac_correctable_errors_total Total correctable memory errors.
# TYPE node_edac_correctable_errors_total counter
node_edac_correctable_errors_total{controller=\"0\"} 5
node_edac_correctable_errors_total{controller=\"1\"} 10
# HELP node_boot_time Node boot time, in unixtime.
# TYPE node_boot_time gauge
node_boot_time 1700000000
"
        );
    }

    #[test]
    fn test_escape_label_value() {
        assert_eq!(escape_label_value("a\"b\\c\nd"), "a\\\"b\\\\c\\nd");
    }
}
