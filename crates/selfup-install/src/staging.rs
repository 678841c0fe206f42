use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, fs_error};

const PREFIX: &str = "selfup-";

/// Uniquely named working directory for one download-and-install run.
///
/// The directory and everything in it is removed on drop, unless ownership
/// was passed on with [`StagingFolder::hand_off`].
#[derive(Debug)]
pub struct StagingFolder {
    path:       PathBuf,
    handed_off: bool,
}

impl StagingFolder {
    /// Create a fresh folder under `root`, creating `root` if needed.
    pub fn new(root: &Path) -> Result<Self> {
        std::fs::create_dir_all(root).map_err(fs_error(root))?;
        let path = root.join(format!("{PREFIX}{}", uuid::Uuid::new_v4().simple()));
        std::fs::create_dir(&path).map_err(fs_error(&path))?;
        debug!(path = %path.display(), "created staging folder");
        Ok(Self {
            path,
            handed_off: false,
        })
    }

    /// Create a fresh folder under the system temp directory.
    pub fn in_temp_dir() -> Result<Self> { Self::new(&std::env::temp_dir()) }

    pub fn path(&self) -> &Path { &self.path }

    /// Give up ownership; the folder is left on disk for whoever cleans it
    /// up next.
    pub fn hand_off(mut self) -> PathBuf {
        self.handed_off = true;
        std::mem::take(&mut self.path)
    }
}

impl Drop for StagingFolder {
    fn drop(&mut self) {
        if self.handed_off || !self.path.exists() {
            return;
        }
        if let Err(e) = std::fs::remove_dir_all(&self.path) {
            debug!(path = %self.path.display(), error = %e, "failed to remove staging folder");
        }
    }
}
