use futures_util::StreamExt;
use selfup_verify::{TrustedSigner, verify_signature};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use super::http::HttpClient;
use super::with_cancel;
use crate::data::{Package, ProgressSink};
use crate::error::{Error, Result};

/// Signature sidecars live next to the manifest under this suffix.
const SIGNATURE_SUFFIX: &str = ".minisig";

/// Fetch, authenticate and parse the update manifest at `manifest_url`.
///
/// When `signers` is non-empty the manifest must carry a signature from one
/// of them. An empty signer list skips verification entirely.
///
/// Progress: 0.0 before the request, 0.4 once the manifest is read, 0.8 once
/// it is authenticated and 1.0 when it is parsed.
pub async fn discover<C: HttpClient>(
    client: &C,
    manifest_url: &str,
    signers: &[TrustedSigner],
    cancel: &CancellationToken,
    progress: &dyn ProgressSink,
) -> Result<Package> {
    let url = Url::parse(manifest_url).map_err(|source| Error::InvalidUrl {
        url: manifest_url.to_string(),
        source,
    })?;
    info!(url = %url, "discovering update package");
    progress.set_progress(0.0);

    let content = fetch_bytes(client, &url, cancel).await?;
    progress.set_progress(0.4);

    if signers.is_empty() {
        debug!(url = %url, "no trusted signers configured, skipping signature check");
    } else {
        let sig_url = signature_url(manifest_url)?;
        let sig = fetch_bytes(client, &sig_url, cancel).await?;
        let sig = String::from_utf8_lossy(&sig);
        let key_id = verify_signature(&content, &sig, signers).map_err(|source| Error::Signature {
            url: sig_url.to_string(),
            source,
        })?;
        debug!(url = %url, key_id = %key_id, "manifest signature verified");
    }
    progress.set_progress(0.8);

    let package = Package::parse(&content, &url).map_err(|source| Error::Manifest {
        url: url.to_string(),
        source,
    })?;
    progress.set_progress(1.0);

    info!(version = %package.version(), uris = package.uris().len(), "update package discovered");
    Ok(package)
}

fn signature_url(manifest_url: &str) -> Result<Url> {
    let raw = format!("{manifest_url}{SIGNATURE_SUFFIX}");
    Url::parse(&raw).map_err(|source| Error::InvalidUrl { url: raw, source })
}

/// GET `url` into memory. Any non-2xx status is an error.
async fn fetch_bytes<C: HttpClient>(
    client: &C,
    url: &Url,
    cancel: &CancellationToken,
) -> Result<Vec<u8>> {
    let response = with_cancel(cancel, client.get(url))
        .await?
        .map_err(|e| Error::network(url, e))?;
    if !response.is_success() {
        return Err(Error::HttpStatus {
            url:    url.to_string(),
            status: response.status,
        });
    }

    let mut body = response.body;
    let mut content = Vec::with_capacity(response.content_length.unwrap_or(0).min(1 << 20) as usize);
    while let Some(chunk) = with_cancel(cancel, body.next()).await? {
        let chunk = chunk.map_err(|e| Error::network(url, e))?;
        content.extend_from_slice(&chunk);
    }
    Ok(content)
}
