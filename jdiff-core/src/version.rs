//! Diff stream versions.
//!
//! A version picks the quantization table the encoder applies and, on the
//! viewer side, the matching reversal table. It travels out of band next to
//! every encoded frame.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::JdiffError;

/// Every version number understood by both the encoder and [`crate::DiffDecoder`].
pub const SUPPORTED_VERSIONS: [u32; 4] = [1, 2, 3, 4];

/// A supported diff version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum Version {
    /// Clamp extreme deltas, keep full precision near zero.
    V1 = 1,
    /// Halve colour depth uniformly.
    V2 = 2,
    /// Non-uniform, half-height output band.
    V3 = 3,
    /// Non-uniform, full output band.
    V4 = 4,
}

impl Version {
    pub const ALL: [Version; 4] = [Version::V1, Version::V2, Version::V3, Version::V4];

    pub const fn number(self) -> u32 {
        self as u32
    }

    /// Position of this version in [`Version::ALL`].
    pub(crate) const fn index(self) -> usize {
        self as usize - 1
    }
}

impl TryFrom<u32> for Version {
    type Error = JdiffError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Version::V1),
            2 => Ok(Version::V2),
            3 => Ok(Version::V3),
            4 => Ok(Version::V4),
            other => Err(JdiffError::UnsupportedVersion(other)),
        }
    }
}

impl From<Version> for u32 {
    fn from(v: Version) -> Self {
        v.number()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.number())
    }
}

impl FromStr for Version {
    type Err = JdiffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches(['v', 'V']);
        let n: u32 = digits
            .parse()
            .map_err(|_| JdiffError::Config(format!("invalid diff version '{s}'")))?;
        Version::try_from(n)
    }
}
