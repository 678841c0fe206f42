//! Secure self-update.
//!
//! [`Updater::check`] fetches and authenticates the product's update
//! manifest while it looks up the locally installed version;
//! [`Updater::download_and_install`] downloads the installer, verifies its
//! digest and hands it to a detached launcher that outlives the caller.
//!
//! ```no_run
//! use selfup::{Updater, UpdaterConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = UpdaterConfig::load("selfup.toml")?;
//! let updater = Updater::from_config(&config)?;
//! let cancel = CancellationToken::new();
//!
//! let signers = config.trusted_signers()?;
//! let result = updater
//!     .check(&config.manifest_url, &signers, &config.product_id, &cancel)
//!     .await?;
//! if result.update_available() {
//!     let package = &result.package;
//!     updater
//!         .download_and_install(package.uris(), package.hash(), package.arguments(), &cancel, &selfup::NoProgress)
//!         .await?;
//! }
//! updater.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub use config::{ClientConfig, ConfigError, UpdaterConfig};
pub use error::{Error, ErrorKind, Result};
pub use updater::{UpdateCheckResult, Updater};

pub use selfup_fetch::{NoProgress, Package, ProgressSink};
pub use selfup_platform::{InstalledProducts, ProductIdentifier, ProductRecord, StaticProducts};
pub use selfup_verify::{AlgorithmMask, Hash, TrustedSigner};
pub use selfup_version::Version;

mod config;
mod error;
mod updater;
