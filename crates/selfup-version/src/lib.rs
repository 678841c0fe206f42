//! Product version parsing, formatting and comparison.
//!
//! A [`Version`] is a fixed vector of four non-negative integers, written as
//! `n.n.n.n` in update manifests. Shorter strings leave the remaining
//! components at zero.
//!
//! # Comparison
//!
//! [`Version::is_newer`] reports whether *any* component of one version is
//! greater than the matching component of the other. This is not a total
//! order and `Version` intentionally does not implement `Ord`; existing
//! manifests are published against this rule.
//!
//! # Example
//!
//! ```
//! use selfup_version::Version;
//!
//! let available: Version = "2.0.0".parse().unwrap();
//! let installed = Version::new(1, 9, 5, 0);
//!
//! assert!(available.is_newer(&installed));
//! assert_eq!(available.to_string(), "2.0");
//! ```

pub use self::version::{Version, VersionError};

mod version;
