//! TOML configuration for [`Updater`](crate::Updater).

use std::path::{Path, PathBuf};
use std::time::Duration;

use selfup_fetch::ClientOptions;
use selfup_verify::{SignatureError, TrustedSigner};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("missing or empty `{0}`")]
    MissingField(&'static str),

    #[error("invalid signer #{index}: {source}")]
    Signer {
        index:  usize,
        source: SignatureError,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] selfup_fetch::TransportError),
}

/// Updater settings.
///
/// ```toml
/// manifest_url = "https://example.org/product.windows.json"
/// product_id   = "{EF5D5806-B90B-4AA3-800A-2D7EA1592BA0}"
/// signers      = ["RWRP...|2"]
///
/// [client]
/// connect_timeout = 15
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdaterConfig {
    pub manifest_url: String,
    pub product_id:   String,
    /// Minisign public keys, each optionally followed by `|<algorithm mask>`.
    #[serde(default)]
    pub signers:      Vec<String>,
    /// Parent of per-run staging folders. Defaults to the temp directory.
    #[serde(default)]
    pub staging_dir:  Option<PathBuf>,
    #[serde(default)]
    pub client:       ClientConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    pub user_agent:      Option<String>,
    /// Seconds.
    pub connect_timeout: Option<u64>,
}

impl UpdaterConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        if config.manifest_url.trim().is_empty() {
            return Err(ConfigError::MissingField("manifest_url"));
        }
        if config.product_id.trim().is_empty() {
            return Err(ConfigError::MissingField("product_id"));
        }
        Ok(config)
    }

    /// Parse [`signers`](Self::signers) into a trust store.
    pub fn trusted_signers(&self) -> Result<Vec<TrustedSigner>, ConfigError> {
        self.signers
            .iter()
            .enumerate()
            .map(|(index, s)| {
                s.parse()
                    .map_err(|source| ConfigError::Signer { index, source })
            })
            .collect()
    }

    pub fn client_options(&self) -> ClientOptions {
        let mut options = ClientOptions::default();
        if let Some(user_agent) = &self.client.user_agent {
            options.user_agent = user_agent.clone();
        }
        if let Some(secs) = self.client.connect_timeout {
            options.connect_timeout = Some(Duration::from_secs(secs));
        }
        options
    }

    pub fn staging_root(&self) -> PathBuf {
        self.staging_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}
