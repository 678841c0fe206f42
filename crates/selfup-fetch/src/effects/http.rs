use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use url::Url;

/// A boxed stream type for response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Response head plus a streaming body.
///
/// The body is only polled when the status is a success.
pub struct HttpResponse<E> {
    pub status:              u16,
    pub content_length:      Option<u64>,
    pub content_disposition: Option<String>,
    pub body:                BoxStream<'static, Result<Bytes, E>>,
}

impl<E> HttpResponse<E> {
    pub fn is_success(&self) -> bool { (200..300).contains(&self.status) }
}

impl<E> std::fmt::Debug for HttpResponse<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_length", &self.content_length)
            .field("content_disposition", &self.content_disposition)
            .finish_non_exhaustive()
    }
}

/// Asynchronous HTTP client abstraction.
///
/// Implementations follow redirects and apply their own timeouts. A non-2xx
/// status is a successful call; only transport failures are errors.
///
/// # Implementations
///
/// - [`ReqwestClient`]: Production implementation using `reqwest`
/// - Mock implementations for testing
pub trait HttpClient: Send + Sync {
    /// Error type for transport failures.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Issue a GET request for `url`.
    fn get(
        &self,
        url: &Url,
    ) -> impl Future<Output = Result<HttpResponse<Self::Error>, Self::Error>> + Send;
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use std::time::Duration;

    use futures_util::StreamExt;
    use reqwest::header::CONTENT_DISPOSITION;
    use tokio_util::io::ReaderStream;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    pub enum TransportError {
        #[error(transparent)]
        Http(#[from] reqwest::Error),

        #[error(transparent)]
        Io(#[from] std::io::Error),

        #[error("URL does not name a local file")]
        InvalidPath,
    }

    /// Transport settings for [`ReqwestClient`].
    #[derive(Debug, Clone)]
    pub struct ClientOptions {
        pub user_agent:      String,
        pub connect_timeout: Option<Duration>,
    }

    impl Default for ClientOptions {
        fn default() -> Self {
            Self {
                user_agent:      concat!("selfup/", env!("CARGO_PKG_VERSION")).to_string(),
                connect_timeout: Some(Duration::from_secs(30)),
            }
        }
    }

    /// Production HTTP client implementation using reqwest.
    ///
    /// `file://` URLs are served from the local filesystem, a missing file
    /// reporting status 404.
    #[derive(Debug, Clone)]
    pub struct ReqwestClient {
        client: reqwest::Client,
    }

    impl ReqwestClient {
        /// Create a new ReqwestClient with default configuration.
        pub fn new() -> Result<Self, TransportError> { Self::with_options(&ClientOptions::default()) }

        pub fn with_options(options: &ClientOptions) -> Result<Self, TransportError> {
            let mut builder = reqwest::Client::builder().user_agent(options.user_agent.as_str());
            if let Some(timeout) = options.connect_timeout {
                builder = builder.connect_timeout(timeout);
            }
            Ok(Self {
                client: builder.build()?,
            })
        }

        async fn get_file(url: &Url) -> Result<HttpResponse<TransportError>, TransportError> {
            let path = url.to_file_path().map_err(|()| TransportError::InvalidPath)?;
            let file = match tokio::fs::File::open(&path).await {
                Ok(file) => file,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(HttpResponse {
                        status:              404,
                        content_length:      None,
                        content_disposition: None,
                        body:                Box::pin(futures_util::stream::empty()),
                    });
                }
                Err(e) => return Err(e.into()),
            };
            let len = file.metadata().await?.len();
            let body = ReaderStream::new(file).map(|chunk| chunk.map_err(TransportError::from));

            Ok(HttpResponse {
                status:              200,
                content_length:      Some(len),
                content_disposition: None,
                body:                Box::pin(body),
            })
        }
    }

    impl HttpClient for ReqwestClient {
        type Error = TransportError;

        async fn get(&self, url: &Url) -> Result<HttpResponse<Self::Error>, Self::Error> {
            if url.scheme() == "file" {
                return Self::get_file(url).await;
            }

            let response = self.client.get(url.clone()).send().await?;
            let status = response.status().as_u16();
            let content_length = response.content_length();
            let content_disposition = response
                .headers()
                .get(CONTENT_DISPOSITION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let body = response
                .bytes_stream()
                .map(|chunk| chunk.map_err(TransportError::from));

            Ok(HttpResponse {
                status,
                content_length,
                content_disposition,
                body: Box::pin(body),
            })
        }
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::{ClientOptions, ReqwestClient, TransportError};
