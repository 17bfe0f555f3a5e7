//! `--clear`: drop the whole dependency store.

use std::io;
use std::path::Path;

use crate::paths;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
    Removed,
    /// Nothing was installed yet.
    AlreadyClear,
}

/// Remove `<install_root>/node_modules`. The history file is left alone.
pub fn clear_cache(install_root: &Path) -> io::Result<ClearOutcome> {
    let store = paths::store_path(install_root);
    tracing::debug!(store = %store.display(), "clearing dependency store");

    match std::fs::remove_dir_all(&store) {
        Ok(()) => Ok(ClearOutcome::Removed),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ClearOutcome::AlreadyClear),
        Err(e) => Err(e),
    }
}
