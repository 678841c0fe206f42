use selfup_verify::Hash;
use selfup_version::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum PackageError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid URI {uri:?}: {source}")]
    Uri {
        uri:    String,
        source: url::ParseError,
    },
}

/// The wire form of an update manifest.
#[derive(Debug, Serialize, Deserialize)]
struct Document {
    #[serde(default)]
    arguments:     Option<String>,
    #[serde(rename = "uri", default)]
    uris:          Option<Vec<String>>,
    version:       Version,
    #[serde(default)]
    changelog_uri: Option<String>,
    #[serde(rename = "hash-sha256", default)]
    hash:          Hash,
}

/// Available self-update description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    arguments:     String,
    uris:          Vec<Url>,
    version:       Version,
    changelog_uri: Option<Url>,
    hash:          Hash,
}

impl Package {
    /// Parse manifest JSON, resolving relative URIs against `base`.
    ///
    /// The order of the download URIs is kept as published.
    pub fn parse(content: &[u8], base: &Url) -> Result<Self, PackageError> {
        let doc: Document = serde_json::from_slice(content)?;
        let resolve = |uri: String| {
            base.join(&uri)
                .map_err(|source| PackageError::Uri { uri, source })
        };
        let uris = doc
            .uris
            .unwrap_or_default()
            .into_iter()
            .map(resolve)
            .collect::<Result<Vec<_>, _>>()?;
        let changelog_uri = doc
            .changelog_uri
            .filter(|uri| !uri.is_empty())
            .map(resolve)
            .transpose()?;

        Ok(Self {
            arguments: doc.arguments.unwrap_or_default(),
            uris,
            version: doc.version,
            changelog_uri,
            hash: doc.hash,
        })
    }

    /// Installer command line arguments.
    pub fn arguments(&self) -> &str { &self.arguments }

    /// Installer download URIs in fallback order.
    pub fn uris(&self) -> &[Url] { &self.uris }

    pub fn version(&self) -> Version { self.version }

    pub fn changelog_uri(&self) -> Option<&Url> { self.changelog_uri.as_ref() }

    /// Expected SHA-256 digest of the installer.
    pub fn hash(&self) -> &Hash { &self.hash }

    /// Re-encode as manifest JSON with absolute URIs.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&Document {
            arguments:     Some(self.arguments.clone()),
            uris:          Some(self.uris.iter().map(Url::to_string).collect()),
            version:       self.version,
            changelog_uri: Some(
                self.changelog_uri
                    .as_ref()
                    .map(Url::to_string)
                    .unwrap_or_default(),
            ),
            hash:          self.hash,
        })
    }
}
