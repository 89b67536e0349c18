//! In-memory `sysctl` values for testing raw counter decoding.

use std::collections::HashMap;
use std::io;

use crate::collector::layout::TIMEVAL_SEC;
use crate::collector::traits::Sysctl;

/// Size of the `struct timeval` buffer built by [`MockSysctl::with_boot_time`].
const TIMEVAL_SIZE: usize = 16;

#[derive(Debug, Clone, Default)]
pub struct MockSysctl {
    values: HashMap<String, Vec<u8>>,
}

impl MockSysctl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a raw buffer for `name`.
    pub fn with_value(mut self, name: impl Into<String>, buf: Vec<u8>) -> Self {
        self.values.insert(name.into(), buf);
        self
    }

    /// Registers `kern.boottime` as a `struct timeval` with `sec` seconds.
    pub fn with_boot_time(self, sec: i64) -> Self {
        let mut buf = vec![0u8; TIMEVAL_SIZE.max(TIMEVAL_SEC.offset + TIMEVAL_SEC.width)];
        TIMEVAL_SEC.encode(&mut buf, sec);
        self.with_value("kern.boottime", buf)
    }
}

impl Sysctl for MockSysctl {
    fn sysctl_raw(&self, name: &str) -> io::Result<Vec<u8>> {
        self.values.get(name).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("unknown oid {:?}", name),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_sysctl_boot_time() {
        let sysctl = MockSysctl::new().with_boot_time(1_700_000_000);
        let buf = sysctl.sysctl_raw("kern.boottime").unwrap();
        assert_eq!(buf.len(), TIMEVAL_SIZE);
        assert_eq!(TIMEVAL_SEC.decode(&buf), Ok(1_700_000_000));
    }

    #[test]
    fn test_mock_sysctl_unknown() {
        let err = MockSysctl::new().sysctl_raw("kern.ostype").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
