// Build architectures and their two spellings

use std::fmt;
use std::str::FromStr;

/// Architecture this build requests a builder image for.
///
/// Parses both the deb spelling ("amd64", "arm64") and the kernel spelling
/// ("x86_64", "aarch64"); builder image names always embed the kernel
/// spelling, which is what `Display` yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Architecture {
    Amd64,
    Arm64,
}

#[derive(Debug, thiserror::Error)]
#[error("unsupported architecture {0:?}: expected x86_64/amd64 or aarch64/arm64")]
pub struct InvalidArchitecture(String);

impl FromStr for Architecture {
    type Err = InvalidArchitecture;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "amd64" | "x86_64" => Ok(Architecture::Amd64),
            "arm64" | "aarch64" => Ok(Architecture::Arm64),
            other => Err(InvalidArchitecture(other.to_string())),
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Architecture::Amd64 => f.write_str("x86_64"),
            Architecture::Arm64 => f.write_str("aarch64"),
        }
    }
}
