//! `package.json` model and entry-point inference.
//!
//! The same struct deserializes a manifest read from the cache and a version
//! document returned by the registry, so inference never needs to know where
//! the metadata came from.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entry file used when a manifest declares neither `main` nor `exports`.
pub const DEFAULT_ENTRY: &str = "index.js";

/// The subset of package metadata tryout needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PackageManifest {
    /// Published name.
    #[serde(default)]
    pub name: Option<String>,

    /// Published version.
    #[serde(default)]
    pub version: Option<String>,

    /// Explicit single-file entry.
    #[serde(default)]
    pub main: Option<Value>,

    /// Export map: a string, a list, or a (conditional) object.
    #[serde(default)]
    pub exports: Option<Value>,

    /// `"module"` marks `.js` files as ES modules.
    #[serde(default, rename = "type")]
    pub module_type: Option<String>,
}

/// How the host must evaluate an entry file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleFormat {
    /// `module.exports` style, loaded through a `require` wrapper.
    CommonJs,
    /// `import`/`export` syntax, loaded through the engine's module loader.
    EsModule,
}

impl PackageManifest {
    /// Parse manifest bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Parse a registry response, which may be a single document or a list
    /// of documents when a range matched several versions (last one wins).
    pub fn from_registry_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Array(mut docs) => match docs.pop() {
                Some(last) => serde_json::from_value(last),
                None => Ok(Self::default()),
            },
            other => serde_json::from_value(other),
        }
    }

    /// Relative path of the package's public entry file.
    ///
    /// `main` (when a string) wins over `exports`; `exports` is used when it is
    /// a string or a list whose first string element is taken; otherwise
    /// [`DEFAULT_ENTRY`].
    pub fn entry_point(&self) -> String {
        if let Some(Value::String(main)) = &self.main {
            if !main.is_empty() {
                return main.clone();
            }
        }

        self.exports
            .as_ref()
            .and_then(entry_from_exports)
            .unwrap_or_else(|| DEFAULT_ENTRY.to_string())
    }

    /// Format of the given entry file for this package.
    pub fn module_format(&self, entry: &str) -> ModuleFormat {
        if entry.ends_with(".mjs") {
            return ModuleFormat::EsModule;
        }
        if entry.ends_with(".cjs") {
            return ModuleFormat::CommonJs;
        }
        match self.module_type.as_deref() {
            Some("module") => ModuleFormat::EsModule,
            _ => ModuleFormat::CommonJs,
        }
    }
}

fn entry_from_exports(exports: &Value) -> Option<String> {
    match exports {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(|v| v.as_str().map(str::to_string)),
        Value::Object(map) => {
            if let Some(root) = map.get(".") {
                return entry_from_exports(root);
            }
            // Subpath maps without "." export nothing at the package root.
            if map.keys().any(|k| k.starts_with('.')) {
                return None;
            }
            runtime_conditions(map).find_map(first_condition)
        }
        _ => None,
    }
}

/// Condition values a runtime could match; `types` only serves type checkers.
fn runtime_conditions(map: &serde_json::Map<String, Value>) -> impl Iterator<Item = &Value> {
    map.iter()
        .filter(|(key, _)| key.as_str() != "types")
        .map(|(_, value)| value)
}

fn is_declaration(path: &str) -> bool {
    [".d.ts", ".d.mts", ".d.cts"]
        .iter()
        .any(|ext| path.ends_with(ext))
}

fn first_condition(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if is_declaration(s) => None,
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => runtime_conditions(map).find_map(first_condition),
        Value::Array(items) => items.iter().find_map(first_condition),
        _ => None,
    }
}
