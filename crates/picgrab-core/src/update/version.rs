use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static DIGITS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// `major.minor.patch`, compared numerically.
///
/// Parsing takes the first three digit runs of the string and pads missing
/// components with zero, so `"v2"`, `"2.0"` and `"2.0.0-beta"` all read as 2.0.0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version(pub u64, pub u64, pub u64);

impl Version {
    pub fn parse(s: &str) -> Self {
        let mut parts = DIGITS_RE
            .find_iter(s)
            .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX));
        Version(
            parts.next().unwrap_or(0),
            parts.next().unwrap_or(0),
            parts.next().unwrap_or(0),
        )
    }

    pub fn is_newer_than(&self, other: &Version) -> bool {
        self > other
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0, self.1, self.2)
    }
}
