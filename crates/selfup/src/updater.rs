use std::path::PathBuf;
use std::sync::Arc;

use selfup_fetch::{HttpClient, NoProgress, Package, ProgressSink, ReqwestClient, discover, download};
use selfup_install::{StagingFolder, launch};
use selfup_platform::{InstalledProducts, default_products, evaluate_installed};
use selfup_verify::{Hash, TrustedSigner};
use selfup_version::Version;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::info;
use url::Url;

use crate::config::{ConfigError, UpdaterConfig};
use crate::error::Result;

/// Outcome of [`Updater::check`].
#[derive(Debug, Clone)]
pub struct UpdateCheckResult {
    /// The authenticated manifest.
    pub package:   Package,
    /// Locally installed version, `None` when the product is not installed.
    pub installed: Option<Version>,
}

impl UpdateCheckResult {
    /// True when nothing is installed or the offered version is newer than
    /// the installed one.
    pub fn update_available(&self) -> bool {
        self.installed
            .is_none_or(|installed| self.package.version().is_newer(&installed))
    }
}

/// Entry point for checking for and applying self-updates.
///
/// [`Updater::check`] may leave the installed product scan running after it
/// returns an error. Call [`Updater::shutdown`] before dropping the updater
/// to join that work; dropping without it detaches the scan, which then
/// runs to completion on the blocking pool unobserved.
pub struct Updater<C = ReqwestClient> {
    client:       Arc<C>,
    products:     Arc<dyn InstalledProducts>,
    staging_root: PathBuf,
    tasks:        TaskTracker,
}

impl Updater<ReqwestClient> {
    /// Updater with the default HTTP client, the platform's installed
    /// product source and the system temp directory for staging.
    pub fn new() -> Result<Self> {
        let client = ReqwestClient::new().map_err(ConfigError::from)?;
        Ok(Self::with_client(client))
    }

    pub fn from_config(config: &UpdaterConfig) -> Result<Self> {
        let client = ReqwestClient::with_options(&config.client_options()).map_err(ConfigError::from)?;
        Ok(Self::with_client(client).staging_root(config.staging_root()))
    }
}

impl<C: HttpClient + 'static> Updater<C> {
    pub fn with_client(client: C) -> Self {
        Self {
            client:       Arc::new(client),
            products:     default_products(),
            staging_root: std::env::temp_dir(),
            tasks:        TaskTracker::new(),
        }
    }

    /// Replace the installed product source.
    pub fn products(mut self, products: Arc<dyn InstalledProducts>) -> Self {
        self.products = products;
        self
    }

    /// Directory under which staging folders are created.
    pub fn staging_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.staging_root = root.into();
        self
    }

    /// Fetch the manifest at `manifest_url` and look up the installed version
    /// of `product_id`, concurrently.
    ///
    /// A discovery failure is returned as soon as it happens. The installed
    /// product scan is not interrupted in that case; it finishes in the
    /// background and is joined by [`Updater::shutdown`].
    pub async fn check(
        &self,
        manifest_url: &str,
        signers: &[TrustedSigner],
        product_id: &str,
        cancel: &CancellationToken,
    ) -> Result<UpdateCheckResult> {
        let evaluation = {
            let products = self.products.clone();
            let product_id = product_id.to_string();
            let cancel = cancel.clone();
            self.tasks.spawn_blocking(move || {
                evaluate_installed(&*products, &product_id, &cancel, &NoProgress)
            })
        };

        let package = discover(&*self.client, manifest_url, signers, cancel, &NoProgress).await?;
        let installed = evaluation.await??;

        info!(
            available = %package.version(),
            installed = ?installed.map(|v| v.to_string()),
            "update check complete"
        );
        Ok(UpdateCheckResult { package, installed })
    }

    /// Download the installer from the first of `uris` that serves content
    /// matching `expected`, then start it with `arguments` through a detached
    /// launcher.
    ///
    /// Returns once the launcher is running. On failure the staging folder
    /// and everything in it is removed.
    pub async fn download_and_install(
        &self,
        uris: &[Url],
        expected: &Hash,
        arguments: &str,
        cancel: &CancellationToken,
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        let staging = StagingFolder::new(&self.staging_root)?;
        let installer = download(&*self.client, uris, expected, staging.path(), cancel, progress).await?;
        if cancel.is_cancelled() {
            return Err(selfup_fetch::Error::Cancelled.into());
        }

        launch(staging.path(), installer.path(), arguments)?;
        drop(installer);
        let staging = staging.hand_off();
        info!(staging = %staging.display(), "installer handed off");
        Ok(())
    }

    /// Wait for background work started by [`Updater::check`] to finish.
    pub async fn shutdown(&self) {
        self.tasks.close();
        self.tasks.wait().await;
    }
}
