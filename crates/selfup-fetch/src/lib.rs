//! Manifest discovery and installer downloads with streaming verification.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable manifest and progress types
//! - [`core`] - Pure transformations (download file naming)
//! - [`effects`] - I/O operations behind the [`HttpClient`] trait
//!
//! # Key Features
//!
//! - **Authenticated**: manifests are checked against a minisign signer
//!   allow-list before they are parsed
//! - **Single-Pass**: the installer is hashed while it streams to disk
//! - **Fallback**: download URIs are tried in manifest order
//! - **Cancellable**: every request and chunk is bound to a
//!   [`CancellationToken`](tokio_util::sync::CancellationToken)

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use data::{NoProgress, Package, PackageError, ProgressSink};
pub use effects::{
    BoxStream, DownloadedFile, HttpClient, HttpResponse, discover, download,
};

#[cfg(feature = "reqwest")]
pub use effects::{ClientOptions, ReqwestClient, TransportError};

pub use error::{Error, Result, SourceFailure};
