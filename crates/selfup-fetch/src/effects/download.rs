use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use selfup_verify::{Hash, Sha256Hasher};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use super::http::HttpClient;
use super::with_cancel;
use crate::core::resolve_file_name;
use crate::data::ProgressSink;
use crate::error::{Error, Result, SourceFailure};

/// A verified download, open for reading.
#[derive(Debug)]
pub struct DownloadedFile {
    path: PathBuf,
    file: std::fs::File,
}

impl DownloadedFile {
    pub fn path(&self) -> &Path { &self.path }

    pub fn file(&self) -> &std::fs::File { &self.file }

    pub fn into_parts(self) -> (PathBuf, std::fs::File) { (self.path, self.file) }
}

/// Download a file from the first URI that serves content matching
/// `expected`, writing it into `folder`.
///
/// Every failure except cancellation moves on to the next URI. When all of
/// them fail the per-URI reasons are returned in
/// [`Error::ResourceUnavailable`].
pub async fn download<C: HttpClient>(
    client: &C,
    uris: &[Url],
    expected: &Hash,
    folder: &Path,
    cancel: &CancellationToken,
    progress: &dyn ProgressSink,
) -> Result<DownloadedFile> {
    let mut failures = Vec::with_capacity(uris.len());

    for uri in uris {
        info!(uri = %uri, "downloading");
        match download_one(client, uri, expected, folder, cancel, progress).await {
            Ok(file) => {
                info!(path = %file.path.display(), "download verified");
                return Ok(file);
            }
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                warn!(uri = %uri, error = %e, "download failed, trying next source");
                failures.push(SourceFailure {
                    uri:    uri.to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    Err(Error::ResourceUnavailable { failures })
}

async fn download_one<C: HttpClient>(
    client: &C,
    uri: &Url,
    expected: &Hash,
    folder: &Path,
    cancel: &CancellationToken,
    progress: &dyn ProgressSink,
) -> Result<DownloadedFile> {
    let response = with_cancel(cancel, client.get(uri))
        .await?
        .map_err(|e| Error::network(uri, e))?;
    if !response.is_success() {
        return Err(Error::HttpStatus {
            url:    uri.to_string(),
            status: response.status,
        });
    }

    let name = resolve_file_name(response.content_disposition.as_deref(), uri);
    let path = folder.join(&name);
    debug!(uri = %uri, path = %path.display(), "resolved download file name");

    // Declared before the handle so the handle is closed before removal.
    let guard = RemoveOnDrop::new(&path);
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&path)
        .await
        .map_err(|e| Error::io(&path, e))?;

    let total = response.content_length;
    if let Some(len) = total {
        file.set_len(len).await.map_err(|e| Error::io(&path, e))?;
    }

    progress.set_progress(0.0);
    let mut hasher = Sha256Hasher::new();
    let mut received = 0u64;
    let mut body = response.body;
    while let Some(chunk) = with_cancel(cancel, body.next()).await? {
        let chunk = chunk.map_err(|e| Error::network(uri, e))?;
        hasher.update(&chunk);
        with_cancel(cancel, file.write_all(&chunk))
            .await?
            .map_err(|e| Error::io(&path, e))?;
        received += chunk.len() as u64;
        if let Some(total) = total.filter(|&t| t > 0) {
            progress.set_progress((received as f64 / total as f64).min(1.0) as f32);
        }
    }

    file.set_len(received).await.map_err(|e| Error::io(&path, e))?;
    file.flush().await.map_err(|e| Error::io(&path, e))?;
    file.sync_all().await.map_err(|e| Error::io(&path, e))?;
    drop(file.into_std().await);

    let actual = hasher.finalize();
    if !actual.matches(expected) {
        return Err(Error::DigestMismatch {
            url: uri.to_string(),
            expected: *expected,
            actual,
        });
    }

    let file = std::fs::File::open(&path).map_err(|e| Error::io(&path, e))?;
    guard.disarm();
    progress.set_progress(1.0);
    Ok(DownloadedFile { path, file })
}

/// Deletes a partially written file unless disarmed.
struct RemoveOnDrop<'a> {
    path:  &'a Path,
    armed: bool,
}

impl<'a> RemoveOnDrop<'a> {
    fn new(path: &'a Path) -> Self { Self { path, armed: true } }

    fn disarm(mut self) { self.armed = false; }
}

impl Drop for RemoveOnDrop<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = std::fs::remove_file(self.path) {
            debug!(path = %self.path.display(), error = %e, "failed to remove partial download");
        }
    }
}
