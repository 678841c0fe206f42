//! Immutable data types.

mod package;
mod progress;

pub use package::{Package, PackageError};
pub use progress::{NoProgress, ProgressSink};
