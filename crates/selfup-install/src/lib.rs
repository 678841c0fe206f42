//! Installer handoff.
//!
//! The updating process cannot delete files it still holds, so the installer
//! is started by a small auxiliary script that outlives the caller: it runs
//! the installer to completion and then removes the installer, itself and the
//! [`StagingFolder`] they live in.

pub use error::{Error, Result};
pub use launcher::{LAUNCHER_FILE_NAME, LauncherFile, launch, write_launcher};
pub use staging::StagingFolder;

mod error;
mod launcher;
mod staging;
