//! Host runtime seams.
//!
//! The pipeline decides which file to load and what to do with evaluation
//! results; actually running code is the host's job. [`js::JsHost`] is the
//! embedded implementation used by the binary.

pub mod js;
pub mod resolve;

use std::path::Path;
use tryout_schema::ModuleFormat;

use crate::EvalError;

/// Shared value type of a host.
pub trait Host {
    type Value: Clone;
}

/// Exports of a freshly loaded module.
#[derive(Debug, Clone)]
pub struct LoadedModule<V> {
    /// The full export mapping (namespace object or `module.exports`).
    pub namespace: V,
    /// Named exports in declaration order.
    pub exports: Vec<(String, V)>,
}

impl<V> LoadedModule<V> {
    /// Collapse a module that only exports `default` to that value; anything
    /// else stays the full mapping.
    pub fn into_value(mut self) -> V {
        if self.exports.len() == 1 && self.exports[0].0 == "default" {
            if let Some((_, value)) = self.exports.pop() {
                return value;
            }
        }
        self.namespace
    }
}

/// Loads a module by absolute path.
pub trait ModuleHost: Host {
    fn load_module(
        &mut self,
        path: &Path,
        format: ModuleFormat,
    ) -> Result<LoadedModule<Self::Value>, String>;
}

/// What a value can do, as far as promise detection cares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Exposes a callable `then`.
    pub has_then: bool,
    /// Exposes a callable `catch`.
    pub has_catch: bool,
    /// Is an engine-native promise.
    pub native: bool,
}

/// State of a promise-like value once the host has run its pending jobs.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement<V> {
    Fulfilled(V),
    Rejected(EvalError),
    /// Still pending with nothing left to run.
    Pending,
}

/// Executes source text against the session's shared global scope.
pub trait ScriptHost: Host {
    /// Define (or replace) a global binding.
    fn bind(&mut self, name: &str, value: Self::Value) -> Result<(), EvalError>;

    /// Compile and run one input, returning its completion value.
    fn execute(&mut self, source: &str) -> Result<Self::Value, EvalError>;

    fn capabilities(&mut self, value: &Self::Value) -> Capabilities;

    /// Drive `value` to completion. With `wire_rejection` unset only a
    /// success continuation is attached, so a rejection leaves it pending.
    fn settle(&mut self, value: Self::Value, wire_rejection: bool) -> Settlement<Self::Value>;

    /// Human-readable rendering for the prompt.
    fn render(&mut self, value: &Self::Value) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_default_export_is_unwrapped() {
        let module = LoadedModule {
            namespace: "namespace",
            exports: vec![("default".to_string(), "fn")],
        };
        assert_eq!(module.into_value(), "fn");
    }

    #[test]
    fn test_mixed_exports_keep_namespace() {
        let module = LoadedModule {
            namespace: "namespace",
            exports: vec![("default".to_string(), "fn"), ("helper".to_string(), "h")],
        };
        assert_eq!(module.into_value(), "namespace");

        let named = LoadedModule {
            namespace: "namespace",
            exports: vec![("pad".to_string(), "p")],
        };
        assert_eq!(named.into_value(), "namespace");
    }
}
