//! Parsers for sysfs and procfs text counters.
//!
//! These are pure functions over file contents, tested with string inputs.

pub mod parser;

pub use parser::{ParseError, parse_keyed_counter, parse_uint_counter};
