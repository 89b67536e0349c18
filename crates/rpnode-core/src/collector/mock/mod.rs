//! Mock data sources for testing.
//!
//! `MockFs` and `MockSysctl` stand in for sysfs/procfs and `sysctl(3)`, and
//! `scenarios` builds ready-made EDAC and boot-time fixtures on top of them.

mod filesystem;
mod scenarios;
mod sysctl;

pub use filesystem::MockFs;
pub use scenarios::EDAC_MC_ROOT;
pub use sysctl::MockSysctl;
