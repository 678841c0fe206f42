//! Version type and operations.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

static COMPONENT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]+$").unwrap());

/// Number of components carried by every [`Version`].
pub const COMPONENTS: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("invalid version {input:?}: component {component:?} is not a number")]
    InvalidFormat { input: String, component: String },
}

/// Product or file version `n.n.n.n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Version([u32; COMPONENTS]);

impl Version {
    pub const fn new(major: u32, minor: u32, patch: u32, build: u32) -> Self {
        Self([major, minor, patch, build])
    }

    /// Parse a dot-separated version of one to four components.
    ///
    /// Missing trailing components are zero. Components past the fourth are
    /// not inspected.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let mut components = [0u32; COMPONENTS];
        for (slot, part) in components.iter_mut().zip(s.split('.')) {
            *slot = parse_component(s, part)?;
        }
        Ok(Self(components))
    }

    pub const fn components(&self) -> [u32; COMPONENTS] { self.0 }

    pub const fn major(&self) -> u32 { self.0[0] }

    pub const fn minor(&self) -> u32 { self.0[1] }

    pub const fn patch(&self) -> u32 { self.0[2] }

    pub const fn build(&self) -> u32 { self.0[3] }

    /// Returns true if any component of `self` is greater than the same
    /// component of `other`.
    pub fn is_newer(&self, other: &Version) -> bool {
        self.0.iter().zip(other.0.iter()).any(|(a, b)| a > b)
    }

    pub fn is_older_or_equal(&self, other: &Version) -> bool { !self.is_newer(other) }
}

fn parse_component(input: &str, part: &str) -> Result<u32, VersionError> {
    let invalid = || VersionError::InvalidFormat {
        input: input.to_string(),
        component: part.to_string(),
    };
    if !COMPONENT_REGEX.is_match(part) {
        return Err(invalid());
    }
    part.parse().map_err(|_| invalid())
}

impl From<[u32; COMPONENTS]> for Version {
    fn from(components: [u32; COMPONENTS]) -> Self { Self(components) }
}

impl std::str::FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Version::parse(s) }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [major, minor, patch, build] = self.0;
        if build != 0 {
            write!(f, "{}.{}.{}.{}", major, minor, patch, build)
        } else if patch != 0 {
            write!(f, "{}.{}.{}", major, minor, patch)
        } else {
            write!(f, "{}.{}", major, minor)
        }
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VersionVisitor;

        impl Visitor<'_> for VersionVisitor {
            type Value = Version;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a version string such as \"1.2.3.4\"")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Version, E> {
                if v.is_empty() {
                    return Ok(Version::default());
                }
                Version::parse(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_str(VersionVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::{Version, VersionError};

    #[test]
    fn test_parse_fills_missing_components() {
        assert_eq!(Version::parse("1.2.3").unwrap(), Version::new(1, 2, 3, 0));
        assert_eq!(Version::parse("7").unwrap(), Version::new(7, 0, 0, 0));
        assert_eq!(Version::parse("1.0.0.1").unwrap(), Version::new(1, 0, 0, 1));
    }

    #[test]
    fn test_parse_ignores_extra_components() {
        assert_eq!(Version::parse("1.2.3.4.5").unwrap(), Version::new(1, 2, 3, 4));
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        let err = Version::parse("1.a.3").unwrap_err();
        assert_eq!(
            err,
            VersionError::InvalidFormat {
                input: "1.a.3".into(),
                component: "a".into(),
            }
        );
        assert!(Version::parse("").is_err());
        assert!(Version::parse("1..2").is_err());
        assert!(Version::parse("+1.2").is_err());
        assert!(Version::parse(" 1.2").is_err());
        assert!(Version::parse("1.99999999999").is_err());
    }

    #[test]
    fn test_display_trims_trailing_zeros() {
        assert_eq!(Version::new(1, 2, 3, 0).to_string(), "1.2.3");
        assert_eq!(Version::new(1, 0, 0, 0).to_string(), "1.0");
        assert_eq!(Version::new(0, 0, 0, 0).to_string(), "0.0");
        assert_eq!(Version::new(1, 0, 1, 0).to_string(), "1.0.1");
        assert_eq!(Version::new(1, 0, 0, 1).to_string(), "1.0.0.1");
    }

    #[test]
    fn test_display_parse_round_trip() {
        for v in [
            Version::new(1, 2, 3, 0),
            Version::new(1, 0, 0, 0),
            Version::new(1, 0, 0, 1),
            Version::new(4, 0, 12, 9),
        ] {
            assert_eq!(Version::parse(&v.to_string()).unwrap(), v);
        }
    }

    #[test]
    fn test_is_newer() {
        let v = Version::new(1, 2, 3, 4);
        let other = Version::new(1, 2, 3, 0);
        assert!(v.is_newer(&other));
        assert!(!v.is_older_or_equal(&other));
        assert!(!v.is_newer(&v));
        assert!(v.is_older_or_equal(&v));
    }

    #[test]
    fn test_is_newer_is_any_component_greater() {
        // Divergent vectors each count as newer than the other.
        let a = Version::new(2, 0, 0, 0);
        let b = Version::new(1, 5, 0, 0);
        assert!(a.is_newer(&b));
        assert!(b.is_newer(&a));
    }

    #[test]
    fn test_serde_string_form() {
        let v: Version = serde_json::from_str(r#""1.2.3""#).unwrap();
        assert_eq!(v, Version::new(1, 2, 3, 0));
        assert_eq!(serde_json::to_string(&v).unwrap(), r#""1.2.3""#);

        let empty: Version = serde_json::from_str(r#""""#).unwrap();
        assert_eq!(empty, Version::default());

        assert!(serde_json::from_str::<Version>("{}").is_err());
        assert!(serde_json::from_str::<Version>(r#""1.a.3""#).is_err());
    }
}
