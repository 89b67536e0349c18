//! rpnode-core — hardware and kernel counter collection for a pull-based
//! monitoring agent.
//!
//! Provides:
//! - `collector` — instance discovery, counter readers, the EDAC and boot
//!   time collectors, and the collector registry
//! - `metric` — metric descriptors, samples and sinks
//! - `config` — sysfs/procfs root paths
//! - `fmt` — text rendering of samples

pub mod collector;
pub mod config;
pub mod fmt;
pub mod metric;

/// Short git SHA of the build, or `unknown` outside a checkout.
pub const GIT_SHA: &str = env!("GIT_SHA");
