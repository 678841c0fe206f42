//! Pure transformations used by the download effects.

mod filename;

pub use filename::{FALLBACK_FILE_NAME, content_disposition_file_name, resolve_file_name, uri_file_name};
