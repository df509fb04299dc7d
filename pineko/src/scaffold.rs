//! Creation and inspection of the folder layout of a project.

use super::configs::Configuration;
use super::error::Result;
use std::fs;
use std::path::Path;
use tracing::info;

/// Create every folder configured in `cfg` that does not exist yet.
///
/// # Errors
///
/// Returns an error if a folder can not be created.
pub fn set_up_project(cfg: &Configuration) -> Result<()> {
    for (name, folder) in cfg.paths().folders() {
        if !folder.is_dir() {
            fs::create_dir_all(folder)?;
            info!("created folder `{name}` at '{}'", folder.display());
        }
    }

    Ok(())
}

/// Return the name and path of every folder configured in `cfg` that does not exist.
#[must_use]
pub fn check_folders(cfg: &Configuration) -> Vec<(&'static str, &Path)> {
    cfg.paths()
        .folders()
        .into_iter()
        .filter(|(_, folder)| !folder.is_dir())
        .collect()
}
