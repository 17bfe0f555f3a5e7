use dirs::home_dir;
use std::path::{Path, PathBuf};

/// Directory the package manager materializes packages into.
pub const STORE_DIR: &str = "node_modules";

/// Default cache root (~/.tryout), or None if the user's home cannot be resolved.
pub fn try_tryout_home() -> Option<PathBuf> {
    home_dir().map(|h| h.join(".tryout"))
}

/// Dependency store: <root>/node_modules
pub fn store_path(install_root: &Path) -> PathBuf {
    install_root.join(STORE_DIR)
}

/// Install location of a package: <root>/node_modules/<name>
///
/// Scoped names (`@scope/pkg`) land in their scope directory.
pub fn package_dir(install_root: &Path, package: &str) -> PathBuf {
    store_path(install_root).join(package)
}

/// Default history file: <root>/repl_history
pub fn history_path(install_root: &Path) -> PathBuf {
    install_root.join("repl_history")
}

/// Whether `path` can be accessed at all.
///
/// Missing paths, permission errors and dangling links all read as `false`.
pub fn exists(path: &Path) -> bool {
    std::fs::metadata(path).is_ok()
}
