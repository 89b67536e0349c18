//! Parsers for single-value and keyed counter files.

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Parses a single-value counter file such as
/// `/sys/devices/system/edac/mc/mc0/ce_count`.
///
/// Surrounding whitespace is ignored; anything else that is not an unsigned
/// decimal integer is an error.
pub fn parse_uint_counter(content: &str) -> Result<u64, ParseError> {
    let value = content.trim();
    if value.is_empty() {
        return Err(ParseError::new("empty counter file"));
    }
    value
        .parse()
        .map_err(|_| ParseError::new(format!("invalid unsigned integer {:?}", value)))
}

/// Finds `key` in a `key value` per line file (e.g. `btime` in `/proc/stat`)
/// and parses its value.
pub fn parse_keyed_counter(content: &str, key: &str) -> Result<u64, ParseError> {
    for line in content.lines() {
        let mut parts = line.split_whitespace();
        if parts.next() != Some(key) {
            continue;
        }
        let value = parts
            .next()
            .ok_or_else(|| ParseError::new(format!("missing value for {}", key)))?;
        return value
            .parse()
            .map_err(|_| ParseError::new(format!("invalid {} value {:?}", key, value)));
    }
    Err(ParseError::new(format!("{} not found", key)))
}
