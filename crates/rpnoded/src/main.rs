//! rpnoded - hardware and kernel counter collector daemon.
//!
//! Scrapes the enabled collectors on a fixed interval and writes the samples
//! to stdout as text or JSON lines.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;
#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use rpnode_core::collector::{CollectorRegistry, RealFs, ScrapeSummary, factories};
use rpnode_core::config::{DEFAULT_PROCFS_PATH, DEFAULT_SYSFS_PATH, Paths};
use rpnode_core::fmt::render_text;
use rpnode_core::metric::{Metric, ValueType};

/// Output format for scraped samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// `name{label="value"} value` lines with HELP/TYPE headers.
    Text,
    /// One JSON object per sample.
    Json,
}

/// Hardware and kernel counter collector daemon.
#[derive(Parser, Debug)]
#[command(name = "rpnoded", about = "Hardware and kernel counter collector", version)]
struct Args {
    /// Collection interval in seconds.
    #[arg(short, long, default_value = "15")]
    interval: u64,

    /// Path to sysfs (for bind-mounted host trees or testing).
    #[arg(long, default_value = DEFAULT_SYSFS_PATH)]
    sysfs_path: String,

    /// Path to procfs.
    #[arg(long, default_value = DEFAULT_PROCFS_PATH)]
    procfs_path: String,

    /// Comma separated list of collectors to enable.
    #[arg(long, value_delimiter = ',', default_value = "edac,stat")]
    collectors: Vec<String>,

    /// Scrape once, print the samples and exit.
    #[arg(long)]
    once: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Increase logging verbosity (-v for debug, -vv for trace). Default is info level.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

/// One sample as written in JSON output.
#[derive(Debug, Serialize)]
struct JsonSample<'a> {
    timestamp: &'a str,
    name: &'a str,
    #[serde(rename = "type")]
    value_type: ValueType,
    labels: BTreeMap<&'a str, &'a str>,
    value: f64,
}

/// Initializes the tracing subscriber with the appropriate log level.
/// Default level is INFO. Use -q for quiet mode (errors only).
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::INFO,
            1 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["rpnoded", "rpnode_core"] {
        if let Ok(directive) = format!("{}={}", target, level).parse() {
            filter = filter.add_directive(directive);
        }
    }

    // Logs go to stderr so stdout carries only samples.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Renders samples as JSON lines stamped with `timestamp`.
fn render_json(metrics: &[Metric], timestamp: &str) -> String {
    let mut out = String::new();
    for metric in metrics {
        let sample = JsonSample {
            timestamp,
            name: metric.desc().fq_name(),
            value_type: metric.desc().value_type(),
            labels: metric.labels().collect(),
            value: metric.value(),
        };
        match serde_json::to_string(&sample) {
            Ok(line) => {
                out.push_str(&line);
                out.push('\n');
            }
            Err(e) => warn!("Failed to encode sample {}: {}", sample.name, e),
        }
    }
    out
}

/// Describes a scrape for logging.
fn describe_scrape(summary: &ScrapeSummary) -> String {
    summary
        .collectors
        .iter()
        .map(|c| {
            if c.success() {
                format!("{}={} samples", c.name, c.samples)
            } else {
                format!("{}=failed", c.name)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Runs one scrape and writes the samples to stdout.
fn scrape_and_print(registry: &CollectorRegistry, format: Format) -> ScrapeSummary {
    let mut samples: Vec<Metric> = Vec::new();
    let summary = registry.scrape(&mut samples);

    let rendered = match format {
        Format::Text => render_text(&samples),
        Format::Json => {
            let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
            render_json(&samples, &timestamp)
        }
    };

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = stdout
        .write_all(rendered.as_bytes())
        .and_then(|()| stdout.flush())
    {
        error!("Failed to write samples: {}", e);
    }

    summary
}

fn main() {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    info!(
        "rpnoded {} ({}) starting",
        env!("CARGO_PKG_VERSION"),
        rpnode_core::GIT_SHA
    );
    info!(
        "Config: interval={}s, sysfs={}, procfs={}, collectors={}",
        args.interval,
        args.sysfs_path,
        args.procfs_path,
        args.collectors.join(",")
    );

    let paths = Paths::new(&args.sysfs_path, &args.procfs_path);
    let registry =
        match CollectorRegistry::from_names(args.collectors.as_slice(), RealFs::new(), &paths) {
            Ok(registry) => registry,
            Err(e) => {
                let available: Vec<&str> = factories::<RealFs>().keys().copied().collect();
                error!(
                    "Failed to set up collectors: {} (available: {})",
                    e,
                    available.join(", ")
                );
                std::process::exit(2);
            }
        };
    info!(
        "Enabled collectors: {}",
        registry.names().collect::<Vec<_>>().join(", ")
    );

    if args.once {
        let summary = scrape_and_print(&registry, args.format);
        info!("Scrape: {}", describe_scrape(&summary));
        if summary.failed().count() > 0 {
            std::process::exit(1);
        }
        return;
    }

    let interval = Duration::from_secs(args.interval.max(1));

    // Setup graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        r.store(false, Ordering::SeqCst);
    }) {
        warn!("Failed to set Ctrl-C handler: {}", e);
    }

    info!("Starting collection loop");
    let mut scrape_count: u64 = 0;

    while running.load(Ordering::SeqCst) {
        let summary = scrape_and_print(&registry, args.format);
        scrape_count += 1;
        info!("Scrape #{}: {}", scrape_count, describe_scrape(&summary));
        for failed in summary.failed() {
            if let Some(ref e) = failed.error {
                debug!("Collector {} error: {}", failed.name, e);
            }
        }

        // Sleep with periodic checks for shutdown signal
        let sleep_interval = Duration::from_millis(100);
        let mut remaining = interval;
        while remaining > Duration::ZERO && running.load(Ordering::SeqCst) {
            let sleep_time = remaining.min(sleep_interval);
            std::thread::sleep(sleep_time);
            remaining = remaining.saturating_sub(sleep_time);
        }
    }

    info!("Shutdown complete");
}
