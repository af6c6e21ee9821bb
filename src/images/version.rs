// Tolerant gcc version parsing ("5" and "5.0" both mean "5.0.0")

use std::fmt;
use std::str::FromStr;

/// A version string that could not be parsed into major.minor.patch.
#[derive(Debug, thiserror::Error)]
#[error("invalid gcc version {0:?}: expected up to three dot-separated numbers")]
pub struct InvalidVersion(String);

/// Canonical three-part gcc version.
///
/// Builder images advertise loosely-versioned toolchains (a "gcc5" suffix
/// means "gcc 5.0.0"), so parsing tolerates missing minor/patch components
/// and defaults them to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GccVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl GccVersion {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        GccVersion {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for GccVersion {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let parts: Vec<&str> = raw.split('.').collect();
        if parts.len() > 3 {
            return Err(InvalidVersion(s.to_string()));
        }
        let mut components = [0u64; 3];
        for (i, part) in parts.iter().enumerate() {
            components[i] = part.parse().map_err(|_| InvalidVersion(s.to_string()))?;
        }
        Ok(GccVersion::new(components[0], components[1], components[2]))
    }
}

impl fmt::Display for GccVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
