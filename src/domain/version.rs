//! Four-component package version type
//!
//! Versions are compared component-wise: major, then minor, then build, then
//! revision, each numerically. Policy decisions depend on the exact meaning
//! of the components, so this is a plain value type rather than a binding to
//! a semver library.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a version string cannot be parsed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid version string '{0}'")]
pub struct VersionParseError(pub String);

/// A numeric package version with up to four components
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PackageVersion {
    pub major: u64,
    pub minor: u64,
    pub build: u64,
    pub revision: u64,
}

impl PackageVersion {
    /// Creates a three-component version (revision zero)
    pub fn new(major: u64, minor: u64, build: u64) -> Self {
        Self {
            major,
            minor,
            build,
            revision: 0,
        }
    }

    /// Creates a version from all four components
    pub fn from_parts(major: u64, minor: u64, build: u64, revision: u64) -> Self {
        Self {
            major,
            minor,
            build,
            revision,
        }
    }
}

impl FromStr for PackageVersion {
    type Err = VersionParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(VersionParseError(value.to_string()));
        }

        let mut components = [0u64; 4];
        let mut count = 0;
        for part in trimmed.split('.') {
            if count == components.len() {
                return Err(VersionParseError(value.to_string()));
            }
            components[count] = part
                .parse()
                .map_err(|_| VersionParseError(value.to_string()))?;
            count += 1;
        }

        Ok(Self {
            major: components[0],
            minor: components[1],
            build: components[2],
            revision: components[3],
        })
    }
}

impl fmt::Display for PackageVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)?;
        if self.revision > 0 {
            write!(f, ".{}", self.revision)?;
        }
        Ok(())
    }
}

impl Serialize for PackageVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for PackageVersion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        value.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_three_components() {
        let version: PackageVersion = "1.2.3".parse().unwrap();
        assert_eq!(version, PackageVersion::new(1, 2, 3));
    }

    #[test]
    fn test_parse_partial_components() {
        assert_eq!(
            "2".parse::<PackageVersion>().unwrap(),
            PackageVersion::from_parts(2, 0, 0, 0)
        );
        assert_eq!(
            "1.5".parse::<PackageVersion>().unwrap(),
            PackageVersion::from_parts(1, 5, 0, 0)
        );
    }

    #[test]
    fn test_parse_four_components() {
        assert_eq!(
            "1.2.3.4".parse::<PackageVersion>().unwrap(),
            PackageVersion::from_parts(1, 2, 3, 4)
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<PackageVersion>().is_err());
        assert!("abc".parse::<PackageVersion>().is_err());
        assert!("1.2.3.4.5".parse::<PackageVersion>().is_err());
        assert!("1..2".parse::<PackageVersion>().is_err());
        assert!("1.2.3-beta1".parse::<PackageVersion>().is_err());
    }

    #[test]
    fn test_component_ordering() {
        let v1_9 = PackageVersion::new(1, 9, 0);
        let v1_10 = PackageVersion::new(1, 10, 0);
        assert!(v1_10 > v1_9, "1.10.0 must order above 1.9.0");

        assert!(PackageVersion::new(2, 0, 0) > PackageVersion::new(1, 99, 99));
        assert!(PackageVersion::new(1, 0, 2) > PackageVersion::new(1, 0, 1));
        assert!(PackageVersion::from_parts(1, 0, 0, 1) > PackageVersion::new(1, 0, 0));
    }

    #[test]
    fn test_display() {
        assert_eq!(PackageVersion::new(1, 2, 3).to_string(), "1.2.3");
        assert_eq!(PackageVersion::from_parts(1, 2, 3, 4).to_string(), "1.2.3.4");
        assert_eq!("1.0".parse::<PackageVersion>().unwrap().to_string(), "1.0.0");
    }

    #[test]
    fn test_serde_round_trip() {
        let version = PackageVersion::new(4, 17, 21);
        let json = serde_json::to_string(&version).unwrap();
        assert_eq!(json, "\"4.17.21\"");
        let parsed: PackageVersion = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, version);
    }
}
