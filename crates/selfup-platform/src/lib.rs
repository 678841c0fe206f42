//! Detection of the locally installed product version.
//!
//! Installed products are read through the [`InstalledProducts`] seam so the
//! evaluation logic runs unchanged against the Windows uninstall registry or
//! an in-memory record set.

pub use error::{Error, Result};
pub use evaluate::evaluate_installed;
pub use products::{InstalledProducts, ProductIdentifier, ProductRecord, StaticProducts, default_products};

#[cfg(windows)]
pub use registry::UninstallRegistry;

mod error;
mod evaluate;
mod products;
#[cfg(windows)]
mod registry;
