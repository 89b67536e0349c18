//! Hardware and kernel counter collectors.
//!
//! This module discovers counter instances exposed by sysfs, procfs and
//! `sysctl`, reads them and emits typed metrics, with mockable data sources
//! for testing on any host.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    CollectorRegistry                        │
//! │  ┌─────────────────────┐   ┌─────────────────────────────┐  │
//! │  │   EdacCollector     │   │       StatCollector         │  │
//! │  │  - mc*/ce_count ... │   │  - kern.boottime (sysctl)   │  │
//! │  │  - mc*/csrow*/...   │   │  - /proc/stat btime         │  │
//! │  └──────────┬──────────┘   └──────────────┬──────────────┘  │
//! │     discover → identify → CounterSource → MetricSink        │
//! │             └──────────────┬──────────────┘                 │
//! │                 ┌──────────▼──────────┐                     │
//! │                 │ FileSystem / Sysctl │ (traits)            │
//! │                 └──────────┬──────────┘                     │
//! └────────────────────────────┼────────────────────────────────┘
//!                              │
//!              ┌───────────────┼───────────────┐
//!              │               │               │
//!       ┌──────▼──────┐ ┌──────▼──────┐ ┌──────▼──────┐
//!       │   RealFs    │ │   MockFs    │ │  Scenarios  │
//!       │ RealSysctl  │ │ MockSysctl  │ │ (Fixtures)  │
//!       └─────────────┘ └─────────────┘ └─────────────┘
//! ```
//!
//! # Usage
//!
//! ## Production
//!
//! ```ignore
//! use rpnode_core::collector::{CollectorRegistry, RealFs};
//! use rpnode_core::config::Paths;
//!
//! let registry = CollectorRegistry::from_names(&["edac", "stat"], RealFs::new(), &Paths::default())?;
//! let mut samples = Vec::new();
//! let summary = registry.scrape(&mut samples);
//! ```
//!
//! ## Testing (with MockFs)
//!
//! ```
//! use rpnode_core::collector::{Collector, EdacCollector, MockFs};
//! use rpnode_core::config::Paths;
//! use rpnode_core::metric::Metric;
//!
//! let edac = EdacCollector::new(MockFs::edac_two_controllers(), &Paths::default()).unwrap();
//! let mut samples: Vec<Metric> = Vec::new();
//! edac.update(&mut samples).unwrap();
//! assert_eq!(samples.len(), 8);
//! ```

#[allow(clippy::module_inception)]
mod collector;
pub mod counter;
pub mod discover;
pub mod edac;
mod error;
pub mod layout;
pub mod mock;
pub mod procfs;
pub mod stat;
pub mod traits;

pub use collector::{
    Collector, CollectorOutcome, CollectorRegistry, Factory, ScrapeSummary, factories,
};
pub use counter::{CounterSource, KeyedTextCounter, RawCounter, TextCounter};
pub use discover::{Instance, InstanceId, InstancePattern, discover};
pub use edac::EdacCollector;
pub use error::CollectError;
pub use layout::{DecodeError, FieldLayout, TIMEVAL_SEC};
pub use mock::{MockFs, MockSysctl};
pub use stat::StatCollector;
pub use traits::{FileSystem, RealFs, RealSysctl, Sysctl};
