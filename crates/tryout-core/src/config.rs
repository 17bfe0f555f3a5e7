//! Runtime settings handed to the core by the binary.

use std::collections::BTreeMap;
use std::path::PathBuf;

/// Default registry used for metadata queries.
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

/// Everything the pipeline needs to know about its environment.
///
/// Built once by the binary from flags and environment, then passed in.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Cache root; packages live under `<install_root>/node_modules`.
    pub install_root: PathBuf,
    /// Session history file.
    pub history_path: PathBuf,
    /// Start the prompt after loading.
    pub interactive: bool,
    /// Package manager executable.
    pub npm: PathBuf,
    /// Registry base URL for metadata fallbacks.
    pub registry: String,
    /// Variables exposed to packages as `process.env`.
    pub env: BTreeMap<String, String>,
}

impl Settings {
    /// Settings rooted at `install_root` with every other value defaulted.
    pub fn new(install_root: PathBuf) -> Self {
        Self {
            history_path: crate::paths::history_path(&install_root),
            install_root,
            interactive: true,
            npm: PathBuf::from("npm"),
            registry: DEFAULT_REGISTRY.to_string(),
            env: BTreeMap::new(),
        }
    }
}
