//! I/O operations: manifest discovery and installer download.

mod discovery;
mod download;
mod http;

pub use discovery::discover;
pub use download::{DownloadedFile, download};
pub use http::{BoxStream, HttpClient, HttpResponse};

#[cfg(feature = "reqwest")]
pub use http::{ClientOptions, ReqwestClient, TransportError};

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Run `fut` unless `cancel` fires first.
pub(crate) async fn with_cancel<T>(
    cancel: &CancellationToken,
    fut: impl Future<Output = T>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        value = fut => Ok(value),
    }
}
