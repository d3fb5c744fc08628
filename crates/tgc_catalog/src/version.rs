//! Dotted numeric versions.
//!
//! Versions compare component by component as unsigned integers. A missing
//! trailing component counts as zero, so `1.0` and `1.0.0` are the same
//! version even though their text differs.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CatalogError;

/// A parsed template bundle version such as `1.8.12`.
///
/// `Display` and serialization keep the catalog text verbatim. Equal
/// versions may therefore print differently; the catalog loader refuses
/// two equal versions under one template name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    raw: String,
    parts: Vec<u64>,
}

impl Version {
    /// Parse a dotted numeric version string.
    pub fn parse(raw: &str) -> Result<Self, CatalogError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CatalogError::InvalidVersion {
                version: raw.to_string(),
                message: "version is empty".to_string(),
            });
        }

        let parts = trimmed
            .split('.')
            .map(|part| {
                part.parse::<u64>().map_err(|_| CatalogError::InvalidVersion {
                    version: raw.to_string(),
                    message: format!("component '{}' is not a non-negative integer", part),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: trimmed.to_string(),
            parts,
        })
    }

    /// The version text as written in the catalog.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The numeric components.
    pub fn parts(&self) -> &[u64] {
        &self.parts
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.parts.len().max(other.parts.len());
        for i in 0..len {
            let a = self.parts.get(i).copied().unwrap_or(0);
            let b = other.parts.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl FromStr for Version {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = CatalogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Version> for String {
    fn from(version: Version) -> Self {
        version.raw
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).unwrap()
    }

    #[test]
    fn test_numeric_not_lexical_ordering() {
        assert!(v("1.10") > v("1.9"));
        assert!(v("0.23.14") > v("0.23.9"));
        assert!(v("2.0") > v("1.99.99"));
    }

    #[test]
    fn test_missing_components_are_zero() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert!(v("1.0.1") > v("1.0"));
    }

    #[test]
    fn test_rejects_non_numeric() {
        assert!(Version::parse("1.8-rc1").is_err());
        assert!(Version::parse("").is_err());
        assert!(Version::parse("1..2").is_err());
    }

    #[test]
    fn test_display_keeps_raw_text() {
        assert_eq!(v("1.8.12").to_string(), "1.8.12");
        assert_eq!(v(" 1.8 ").as_str(), "1.8");
    }

    #[test]
    fn test_serde_round_trip_as_string() {
        let parsed: Version = serde_json::from_str("\"0.22.4\"").unwrap();
        assert_eq!(parsed.parts(), &[0, 22, 4]);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), "\"0.22.4\"");
        assert!(serde_json::from_str::<Version>("\"x.1\"").is_err());
    }
}
