//! Pre-built mock filesystem scenarios for testing.
//!
//! Paths are rooted at the default `/sys` and `/proc` mount points.

use super::filesystem::MockFs;

/// EDAC memory controller root under the default sysfs mount.
pub const EDAC_MC_ROOT: &str = "/sys/devices/system/edac/mc";

impl MockFs {
    /// Two controllers without csrow directories.
    ///
    /// `mc0`: ce=5, ce_noinfo=0, ue=0, ue_noinfo=0.
    /// `mc1`: ce=10, ce_noinfo=1, ue=0, ue_noinfo=0.
    pub fn edac_two_controllers() -> Self {
        let mut fs = Self::new();
        fs.add_edac_controller(EDAC_MC_ROOT, 0, [5, 0, 0, 0]);
        fs.add_edac_controller(EDAC_MC_ROOT, 1, [10, 1, 0, 0]);
        fs.add_file(format!("{}/power/control", EDAC_MC_ROOT), "auto\n");
        fs
    }

    /// One controller with two chip-select rows.
    pub fn edac_with_csrows() -> Self {
        let mut fs = Self::new();
        let mc0 = fs.add_edac_controller(EDAC_MC_ROOT, 0, [3, 0, 1, 0]);
        fs.add_edac_csrow(&mc0, 0, 2, 1);
        fs.add_edac_csrow(&mc0, 1, 1, 0);
        fs
    }

    /// `mc0` exists but its `ce_count` file is missing.
    pub fn edac_missing_ce_count() -> Self {
        let mut fs = Self::edac_two_controllers();
        fs.remove_file(format!("{}/mc0/ce_count", EDAC_MC_ROOT));
        fs
    }

    /// EDAC root present with no controllers (driver loaded, no hardware).
    pub fn edac_no_controllers() -> Self {
        let mut fs = Self::new();
        fs.add_dir(EDAC_MC_ROOT);
        fs.add_file(format!("{}/power/control", EDAC_MC_ROOT), "auto\n");
        fs
    }

    /// Minimal `/proc/stat` with boot time 1700000000.
    pub fn proc_stat() -> Self {
        let mut fs = Self::new();
        fs.add_file(
            "/proc/stat",
            "\
cpu  10000 500 3000 80000 1000 200 100 0 0 0
cpu0 2500 125 750 20000 250 50 25 0 0 0
intr 1000000 50 0 0 0 0 0 0 0 1 0 0 0 100 0 0 1000
ctxt 500000
btime 1700000000
processes 10000
procs_running 2
procs_blocked 0
",
        );
        fs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::traits::FileSystem;
    use std::path::Path;

    #[test]
    fn test_two_controllers_have_counters() {
        let fs = MockFs::edac_two_controllers();
        for counter in ["ce_count", "ce_noinfo_count", "ue_count", "ue_noinfo_count"] {
            assert!(fs.exists(&Path::new(EDAC_MC_ROOT).join("mc0").join(counter)));
            assert!(fs.exists(&Path::new(EDAC_MC_ROOT).join("mc1").join(counter)));
        }
    }

    #[test]
    fn test_missing_ce_count() {
        let fs = MockFs::edac_missing_ce_count();
        assert!(!fs.exists(Path::new("/sys/devices/system/edac/mc/mc0/ce_count")));
        assert!(fs.exists(Path::new("/sys/devices/system/edac/mc/mc1/ce_count")));
    }

    #[test]
    fn test_csrows() {
        let fs = MockFs::edac_with_csrows();
        assert!(fs.exists(Path::new("/sys/devices/system/edac/mc/mc0/csrow1/ue_count")));
    }

    #[test]
    fn test_proc_stat() {
        let fs = MockFs::proc_stat();
        let stat = fs.read_to_string(Path::new("/proc/stat")).unwrap();
        assert!(stat.contains("btime 1700000000"));
    }
}
