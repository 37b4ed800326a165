use crate::error::{ErrorKind, RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A version as it appears in a document: text or a bare number.
#[derive(Debug, Clone, PartialEq)]
pub enum RawVersion {
    Text(String),
    Number(serde_json::Number),
}

impl From<&str> for RawVersion {
    fn from(s: &str) -> Self {
        RawVersion::Text(s.to_string())
    }
}

impl From<String> for RawVersion {
    fn from(s: String) -> Self {
        RawVersion::Text(s)
    }
}

impl From<u64> for RawVersion {
    fn from(n: u64) -> Self {
        RawVersion::Number(n.into())
    }
}

impl fmt::Display for RawVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawVersion::Text(s) => f.write_str(s),
            RawVersion::Number(n) => write!(f, "{}", n),
        }
    }
}

/// A version canonicalized to exactly three dot-separated parts.
///
/// Normalization does not check that the parts are numeric; that happens in
/// [`Version::components`], which every comparison goes through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn normalize(input: impl Into<RawVersion>) -> Self {
        let text = input.into().to_string();
        let mut parts: Vec<&str> = text.trim().split('.').collect();
        parts.resize(3, "0");
        Version(parts.join("."))
    }

    /// Normalize and re-render from the numeric parts, so `"1.01"`, `"+1.1"`
    /// and `"1.1"` all become `1.1.0`. This is the form stored in the index.
    pub fn canonical(input: impl Into<RawVersion>) -> Result<Self> {
        let [major, minor, patch] = Self::normalize(input).components()?;
        Ok(Version(format!("{}.{}.{}", major, minor, patch)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `[major, minor, patch]`; missing parts count as zero.
    pub fn components(&self) -> Result<[u64; 3]> {
        let mut out = [0u64; 3];
        for (slot, part) in out.iter_mut().zip(self.0.split('.')) {
            *slot = part.parse().map_err(|_| {
                RegistryError::step(
                    ErrorKind::InvalidVersion,
                    format!("Version '{}' has a non-numeric component '{}'", self.0, part),
                )
            })?;
        }
        Ok(out)
    }

    /// Numeric MAJOR, MINOR, PATCH ordering.
    pub fn compare(&self, other: &Version) -> Result<Ordering> {
        Ok(self.components()?.cmp(&other.components()?))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
