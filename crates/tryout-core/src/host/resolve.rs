//! `require()` resolution for the CommonJS wrapper.

use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tryout_schema::PackageManifest;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Built-in module '{0}' is not available in this host")]
    Builtin(String),

    #[error("Cannot find module '{specifier}' from {}", .from.display())]
    NotFound { specifier: String, from: PathBuf },
}

const CORE_MODULES: &[&str] = &[
    "assert",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "crypto",
    "dgram",
    "dns",
    "events",
    "fs",
    "http",
    "http2",
    "https",
    "module",
    "net",
    "os",
    "path",
    "perf_hooks",
    "process",
    "querystring",
    "readline",
    "stream",
    "string_decoder",
    "timers",
    "tls",
    "tty",
    "url",
    "util",
    "v8",
    "vm",
    "worker_threads",
    "zlib",
];

fn is_core(specifier: &str) -> bool {
    let root = specifier.split('/').next().unwrap_or(specifier);
    CORE_MODULES.contains(&root)
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
        || Path::new(specifier).is_absolute()
}

/// Resolve `specifier` as required from the file `from`.
///
/// Bare specifiers that name a Node core module are served from
/// `node_modules` when a package of that name is installed, otherwise
/// they fail with [`ResolveError::Builtin`].
pub fn resolve(from: &Path, specifier: &str) -> Result<PathBuf, ResolveError> {
    if let Some(core) = specifier.strip_prefix("node:") {
        return Err(ResolveError::Builtin(core.to_string()));
    }

    let dir = from.parent().unwrap_or(Path::new("/"));

    let found = if is_relative(specifier) {
        resolve_path(&normalize(&dir.join(specifier)))
    } else {
        dir.ancestors()
            .filter(|d| d.file_name().is_none_or(|n| n != "node_modules"))
            .find_map(|d| resolve_path(&d.join("node_modules").join(specifier)))
    };

    match found {
        Some(path) => Ok(path),
        None if !is_relative(specifier) && is_core(specifier) => {
            Err(ResolveError::Builtin(specifier.to_string()))
        }
        None => Err(ResolveError::NotFound {
            specifier: specifier.to_string(),
            from: from.to_path_buf(),
        }),
    }
}

/// Resolve a file or directory path the way `require` would, trying the
/// usual extensions and directory entries.
pub fn resolve_path(base: &Path) -> Option<PathBuf> {
    resolve_file(base).or_else(|| resolve_dir(base))
}

fn resolve_file(base: &Path) -> Option<PathBuf> {
    if base.is_file() {
        return Some(base.to_path_buf());
    }
    ["js", "json", "cjs"].iter().find_map(|ext| {
        let mut name = base.as_os_str().to_owned();
        name.push(".");
        name.push(ext);
        let candidate = PathBuf::from(name);
        candidate.is_file().then_some(candidate)
    })
}

fn resolve_dir(base: &Path) -> Option<PathBuf> {
    if !base.is_dir() {
        return None;
    }

    let manifest = std::fs::read(base.join("package.json"))
        .ok()
        .and_then(|bytes| PackageManifest::from_slice(&bytes).ok());
    if let Some(manifest) = manifest {
        let entry = normalize(&base.join(manifest.entry_point()));
        if entry != base {
            if let Some(found) = resolve_file(&entry).or_else(|| index_of(&entry)) {
                return Some(found);
            }
        }
    }

    index_of(base)
}

fn index_of(dir: &Path) -> Option<PathBuf> {
    ["index.js", "index.json"]
        .iter()
        .map(|f| dir.join(f))
        .find(|p| p.is_file())
}

/// Lexically remove `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
