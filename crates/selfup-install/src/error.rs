use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("filesystem error on {}: {source}", path.display())]
    Filesystem {
        path:   PathBuf,
        source: std::io::Error,
    },

    #[error("failed to start {}: {source}", program.display())]
    ProcessLaunch {
        program: PathBuf,
        source:  std::io::Error,
    },
}

pub(crate) fn fs_error(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Error {
    let path = path.into();
    move |source| Error::Filesystem { path, source }
}
