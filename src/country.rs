use std::fmt;

use serde::{Serialize, Serializer};

/// Normalized ISO 3166-1 alpha-2 country code (two uppercase ASCII letters).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CountryCode([u8; 2]);

impl CountryCode {
    /// Parses a two-letter code, case-insensitively.
    /// Returns `None` for anything that isn't exactly two ASCII letters.
    pub fn parse(s: &str) -> Option<Self> {
        let [a, b]: [u8; 2] = s.trim().as_bytes().try_into().ok()?;
        if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() {
            Some(Self([a.to_ascii_uppercase(), b.to_ascii_uppercase()]))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        // both bytes are ASCII letters
        std::str::from_utf8(&self.0).unwrap_or("??")
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for CountryCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of resolving a source address to its country of origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "code")]
pub enum Resolution {
    Country(CountryCode),
    /// The address is valid but no country is mapped to it.
    Unknown,
    /// The lookup provider errored or timed out.
    LookupFailed,
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Country(code) => write!(f, "{code}"),
            Resolution::Unknown => f.write_str("unknown"),
            Resolution::LookupFailed => f.write_str("lookup failed"),
        }
    }
}
