//! Embedded JavaScript host on top of `boa_engine`.
//!
//! One [`Context`] lives for the whole session, so bindings made by the
//! loader and declarations typed at the prompt share one global scope.
//! CommonJS packages run through a small `require()` shim whose file access
//! and resolution are native functions backed by [`super::resolve`]; ES
//! modules go through boa's own module loader rooted at the package store.

use boa_engine::builtins::promise::PromiseState;
use boa_engine::module::SimpleModuleLoader;
use boa_engine::object::builtins::{JsArray, JsPromise};
use boa_engine::object::ObjectInitializer;
use boa_engine::property::Attribute;
use boa_engine::{
    js_string, Context, JsArgs, JsError, JsNativeError, JsObject, JsResult, JsString, JsValue,
    Module, NativeFunction, Source,
};
use boa_runtime::Console;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tryout_schema::ModuleFormat;

use super::{resolve, Capabilities, Host, LoadedModule, ModuleHost, ScriptHost, Settlement};
use crate::{paths, EvalError, TryoutError};

/// Node-ish globals packages commonly touch at load time. Timers run on the
/// job queue without honouring their delay.
const PRELUDE: &str = r#"
(function (env, platform) {
  var g = globalThis;
  g.global = g;
  var pending = Object.create(null);
  var nextId = 1;
  function defer(fn, args) {
    var id = nextId++;
    pending[id] = true;
    Promise.resolve().then(function () {
      if (pending[id]) {
        delete pending[id];
        fn.apply(null, args);
      }
    });
    return id;
  }
  g.setTimeout = function (fn) { return defer(fn, Array.prototype.slice.call(arguments, 2)); };
  g.setImmediate = function (fn) { return defer(fn, Array.prototype.slice.call(arguments, 1)); };
  g.clearTimeout = g.clearImmediate = function (id) { delete pending[id]; };
  g.process = {
    env: JSON.parse(env),
    argv: ['tryout'],
    platform: platform,
    version: 'v18.0.0',
    versions: {},
    cwd: function () { return '/'; },
    nextTick: function (fn) { defer(fn, Array.prototype.slice.call(arguments, 1)); }
  };
})
"#;

/// Builds `load(filename)` with a per-session module cache.
const COMMONJS: &str = r#"
(function (host) {
  var cache = Object.create(null);
  function makeRequire(parent) {
    function require(specifier) {
      return load(host.resolve(parent, String(specifier)));
    }
    require.resolve = function (specifier) {
      return host.resolve(parent, String(specifier));
    };
    require.cache = cache;
    return require;
  }
  function load(filename) {
    var cached = cache[filename];
    if (cached) {
      return cached.exports;
    }
    var module = { id: filename, filename: filename, exports: {}, loaded: false };
    cache[filename] = module;
    try {
      var source = host.read(filename);
      if (/\.json$/.test(filename)) {
        module.exports = JSON.parse(source);
      } else {
        if (source.charCodeAt(0) === 35 && source.charCodeAt(1) === 33) {
          source = '//' + source;
        }
        var wrapper = (0, eval)(
          '(function (exports, require, module, __filename, __dirname) {' + source + '\n})'
        );
        module.require = makeRequire(filename);
        wrapper.call(module.exports, module.exports, module.require, module,
          filename, host.dirname(filename));
      }
    } catch (e) {
      delete cache[filename];
      throw e;
    }
    module.loaded = true;
    return module.exports;
  }
  return load;
})
"#;

/// Adopts a foreign thenable with only a success continuation attached.
const ADOPT: &str = r"
(function (thenable) {
  return new Promise(function (resolve) { thenable.then(resolve); });
})
";

const KEYS: &str = "(function (ns) { return Object.keys(ns); })";

pub struct JsHost {
    context: Context,
    require: JsObject,
    adopt: JsObject,
    keys: JsObject,
}

impl fmt::Debug for JsHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsHost").finish_non_exhaustive()
    }
}

impl Host for JsHost {
    type Value = JsValue;
}

impl JsHost {
    /// Start a fresh session whose ES module loader is rooted at the store
    /// under `install_root`. The store directory is created if missing.
    /// `process.env` starts empty.
    pub fn new(install_root: &Path) -> Result<Self, TryoutError> {
        Self::with_env(install_root, &BTreeMap::new())
    }

    /// Like [`JsHost::new`], exposing `env` as `process.env`.
    pub fn with_env(install_root: &Path, env: &BTreeMap<String, String>) -> Result<Self, TryoutError> {
        let store = paths::store_path(install_root);
        std::fs::create_dir_all(&store)?;

        let loader = SimpleModuleLoader::new(&store).map_err(|e| TryoutError::Host(e.to_string()))?;
        let mut context = Context::builder()
            .module_loader(Rc::new(loader))
            .build()
            .map_err(|e| TryoutError::Host(e.to_string()))?;

        let console = Console::init(&mut context);
        context
            .register_global_property(Console::NAME, console, Attribute::all())
            .map_err(|e| TryoutError::Host(e.to_string()))?;

        install_prelude(&mut context, env).map_err(|e| TryoutError::Host(e.to_string()))?;

        let native = ObjectInitializer::new(&mut context)
            .function(NativeFunction::from_fn_ptr(host_read), js_string!("read"), 1)
            .function(NativeFunction::from_fn_ptr(host_resolve), js_string!("resolve"), 2)
            .function(NativeFunction::from_fn_ptr(host_dirname), js_string!("dirname"), 1)
            .build();

        let factory = compile_function(&mut context, COMMONJS)?;
        let require = factory
            .call(&JsValue::undefined(), &[native.into()], &mut context)
            .map_err(|e| TryoutError::Host(e.to_string()))?
            .as_object()
            .cloned()
            .ok_or_else(|| TryoutError::Host("require shim did not return a function".into()))?;

        let adopt = compile_function(&mut context, ADOPT)?;
        let keys = compile_function(&mut context, KEYS)?;

        Ok(Self {
            context,
            require,
            adopt,
            keys,
        })
    }

    fn describe(&mut self, err: &JsError) -> String {
        match err.try_native(&mut self.context) {
            Ok(native) => native.to_string(),
            Err(_) => err.to_string(),
        }
    }

    fn describe_reason(&mut self, reason: JsValue) -> EvalError {
        EvalError::new(self.describe(&JsError::from_opaque(reason)))
    }

    fn load_commonjs(&mut self, path: &Path) -> JsResult<LoadedModule<JsValue>> {
        let filename = JsValue::from(JsString::from(path.to_string_lossy().as_ref()));
        let exports = self
            .require
            .call(&JsValue::undefined(), &[filename], &mut self.context)?;
        self.context.run_jobs();
        Ok(LoadedModule {
            namespace: exports.clone(),
            exports: vec![("default".to_string(), exports)],
        })
    }

    fn load_esm(&mut self, path: &Path) -> JsResult<LoadedModule<JsValue>> {
        // The module loader rejects imports outside its canonical root.
        let path = &path.canonicalize().map_err(|e| {
            JsNativeError::error().with_message(format!("could not open {}: {e}", path.display()))
        })?;
        let source = Source::from_filepath(path).map_err(|e| {
            JsNativeError::error().with_message(format!("could not open {}: {e}", path.display()))
        })?;
        let module = Module::parse(source, None, &mut self.context)?;
        let promise = module.load_link_evaluate(&mut self.context);
        self.context.run_jobs();

        match promise.state() {
            PromiseState::Fulfilled(_) => {}
            PromiseState::Rejected(reason) => return Err(JsError::from_opaque(reason)),
            PromiseState::Pending => {
                return Err(JsNativeError::error()
                    .with_message("module evaluation never completed")
                    .into());
            }
        }

        let namespace = module.namespace(&mut self.context);
        let keys = self.keys.call(
            &JsValue::undefined(),
            &[namespace.clone().into()],
            &mut self.context,
        )?;
        let keys = keys
            .as_object()
            .cloned()
            .map(JsArray::from_object)
            .transpose()?
            .ok_or_else(|| JsNativeError::typ().with_message("namespace keys are not an array"))?;

        let mut exports = Vec::new();
        for index in 0..keys.length(&mut self.context)? {
            let key = keys
                .at(i64::try_from(index).unwrap_or(i64::MAX), &mut self.context)?
                .to_string(&mut self.context)?;
            let value = namespace.get(key.clone(), &mut self.context)?;
            exports.push((key.to_std_string_escaped(), value));
        }

        Ok(LoadedModule {
            namespace: namespace.into(),
            exports,
        })
    }
}

impl ModuleHost for JsHost {
    fn load_module(
        &mut self,
        path: &Path,
        format: ModuleFormat,
    ) -> Result<LoadedModule<JsValue>, String> {
        tracing::debug!(path = %path.display(), ?format, "loading module");
        let result = match format {
            ModuleFormat::CommonJs => self.load_commonjs(path),
            ModuleFormat::EsModule => self.load_esm(path),
        };
        result.map_err(|e| self.describe(&e))
    }
}

impl ScriptHost for JsHost {
    fn bind(&mut self, name: &str, value: JsValue) -> Result<(), EvalError> {
        self.context
            .global_object()
            .set(JsString::from(name), value, true, &mut self.context)
            .map(|_| ())
            .map_err(|e| EvalError::new(self.describe(&e)))
    }

    fn execute(&mut self, source: &str) -> Result<JsValue, EvalError> {
        let result = self.context.eval(Source::from_bytes(source));
        self.context.run_jobs();
        result.map_err(|e| EvalError::new(self.describe(&e)))
    }

    fn capabilities(&mut self, value: &JsValue) -> Capabilities {
        let Some(object) = value.as_object() else {
            return Capabilities::default();
        };
        let callable = |key: JsString, context: &mut Context| {
            object
                .get(key, context)
                .map(|v| v.is_callable())
                .unwrap_or(false)
        };
        Capabilities {
            has_then: callable(js_string!("then"), &mut self.context),
            has_catch: callable(js_string!("catch"), &mut self.context),
            native: JsPromise::from_object(object.clone()).is_ok(),
        }
    }

    fn settle(&mut self, value: JsValue, wire_rejection: bool) -> Settlement<JsValue> {
        let Some(object) = value.as_object().cloned() else {
            return Settlement::Fulfilled(value);
        };

        let promise = if wire_rejection {
            JsPromise::from_object(object)
        } else {
            self.adopt
                .call(&JsValue::undefined(), &[value], &mut self.context)
                .and_then(|adopted| {
                    adopted
                        .as_object()
                        .cloned()
                        .ok_or_else(|| JsNativeError::typ().with_message("not a promise").into())
                })
                .and_then(JsPromise::from_object)
        };
        let promise = match promise {
            Ok(promise) => promise,
            Err(e) => return Settlement::Rejected(EvalError::new(self.describe(&e))),
        };

        self.context.run_jobs();
        match promise.state() {
            PromiseState::Fulfilled(v) => Settlement::Fulfilled(v),
            PromiseState::Rejected(reason) => Settlement::Rejected(self.describe_reason(reason)),
            PromiseState::Pending => Settlement::Pending,
        }
    }

    fn render(&mut self, value: &JsValue) -> String {
        value.display().to_string()
    }
}

fn compile_function(context: &mut Context, source: &str) -> Result<JsObject, TryoutError> {
    context
        .eval(Source::from_bytes(source))
        .map_err(|e| TryoutError::Host(e.to_string()))?
        .as_object()
        .filter(|o| o.is_callable())
        .cloned()
        .ok_or_else(|| TryoutError::Host("helper did not evaluate to a function".into()))
}

fn install_prelude(context: &mut Context, env: &BTreeMap<String, String>) -> JsResult<()> {
    let env = serde_json::to_string(env).map_err(|e| JsNativeError::typ().with_message(e.to_string()))?;
    let platform = match std::env::consts::OS {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    };

    let prelude = context.eval(Source::from_bytes(PRELUDE))?;
    let prelude = prelude
        .as_callable()
        .cloned()
        .ok_or_else(|| JsNativeError::typ().with_message("prelude is not a function"))?;
    prelude.call(
        &JsValue::undefined(),
        &[
            JsString::from(env.as_str()).into(),
            JsString::from(platform).into(),
        ],
        context,
    )?;
    Ok(())
}

fn string_arg(args: &[JsValue], index: usize, context: &mut Context) -> JsResult<String> {
    Ok(args
        .get_or_undefined(index)
        .to_string(context)?
        .to_std_string_escaped())
}

fn host_read(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let filename = string_arg(args, 0, context)?;
    let contents = std::fs::read_to_string(&filename).map_err(|e| {
        JsNativeError::error().with_message(format!("Cannot read {filename}: {e}"))
    })?;
    Ok(JsString::from(contents.as_str()).into())
}

fn host_resolve(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let from = PathBuf::from(string_arg(args, 0, context)?);
    let specifier = string_arg(args, 1, context)?;
    let resolved = resolve::resolve(&from, &specifier)
        .map_err(|e| JsNativeError::error().with_message(e.to_string()))?;
    Ok(JsString::from(resolved.to_string_lossy().as_ref()).into())
}

fn host_dirname(_this: &JsValue, args: &[JsValue], context: &mut Context) -> JsResult<JsValue> {
    let filename = PathBuf::from(string_arg(args, 0, context)?);
    let dir = filename.parent().unwrap_or(Path::new("/"));
    Ok(JsString::from(dir.to_string_lossy().as_ref()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn host() -> (TempDir, JsHost) {
        let tmp = tempfile::tempdir().unwrap();
        let host = JsHost::new(tmp.path()).unwrap();
        (tmp, host)
    }

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_execute_returns_completion_value() {
        let (_tmp, mut host) = host();
        let value = host.execute("1 + 1").unwrap();
        assert_eq!(host.render(&value), "2");
    }

    #[test]
    fn test_declarations_persist_between_inputs() {
        let (_tmp, mut host) = host();
        host.execute("var counter = 41").unwrap();
        let value = host.execute("counter + 1").unwrap();
        assert_eq!(value.as_number(), Some(42.0));
    }

    #[test]
    fn test_sync_throw_is_eval_error() {
        let (_tmp, mut host) = host();
        let err = host.execute("throw new TypeError('nope')").unwrap_err();
        assert!(err.message.contains("TypeError"));
        assert!(err.message.contains("nope"));
    }

    #[test]
    fn test_bind_exposes_global() {
        let (_tmp, mut host) = host();
        host.bind("answer", JsValue::from(42)).unwrap();
        let value = host.execute("answer * 2").unwrap();
        assert_eq!(value.as_number(), Some(84.0));
    }

    #[test]
    fn test_capabilities() {
        let (_tmp, mut host) = host();
        let promise = host.execute("Promise.resolve(1)").unwrap();
        assert_eq!(
            host.capabilities(&promise),
            Capabilities {
                has_then: true,
                has_catch: true,
                native: true
            }
        );

        let thenable = host.execute("({ then: function () {} })").unwrap();
        let caps = host.capabilities(&thenable);
        assert!(caps.has_then);
        assert!(!caps.has_catch);
        assert!(!caps.native);

        let plain = host.execute("42").unwrap();
        assert_eq!(host.capabilities(&plain), Capabilities::default());
    }

    #[test]
    fn test_settle_native_promise() {
        let (_tmp, mut host) = host();
        let promise = host.execute("Promise.resolve(5)").unwrap();
        match host.settle(promise, true) {
            Settlement::Fulfilled(v) => assert_eq!(v.as_number(), Some(5.0)),
            other => panic!("expected fulfilment, got {other:?}"),
        }

        let rejected = host.execute("Promise.reject(new Error('boom'))").unwrap();
        match host.settle(rejected, true) {
            Settlement::Rejected(e) => assert!(e.message.contains("boom")),
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_settle_thenable_success_only() {
        let (_tmp, mut host) = host();
        let ok = host
            .execute("({ then: function (resolve) { resolve('done'); } })")
            .unwrap();
        match host.settle(ok, false) {
            Settlement::Fulfilled(v) => assert_eq!(host.render(&v), "\"done\""),
            other => panic!("expected fulfilment, got {other:?}"),
        }

        // Only the success path is attached, so a rejection never arrives.
        let failing = host
            .execute("({ then: function (resolve, reject) { if (reject) reject('x'); } })")
            .unwrap();
        assert_eq!(host.settle(failing, false), Settlement::Pending);
    }

    #[test]
    fn test_load_commonjs_with_nested_require_and_json() {
        let (tmp, mut host) = host();
        let pkg = tmp.path().join("node_modules/pad");
        write(
            &pkg.join("index.js"),
            "#!/usr/bin/env node\nvar util = require('./lib/util');\nvar meta = require('./meta.json');\nmodule.exports = function (s) { return util.wrap(s) + meta.suffix; };\n",
        );
        write(
            &pkg.join("lib/util.js"),
            "exports.wrap = function (s) { return '[' + s + ']'; };\n",
        );
        write(&pkg.join("meta.json"), r#"{"suffix":"!"}"#);

        let module = host
            .load_module(&pkg.join("index.js"), ModuleFormat::CommonJs)
            .unwrap();
        let pad = module.into_value();
        host.bind("pad", pad).unwrap();
        let out = host.execute("pad('x')").unwrap();
        assert_eq!(host.render(&out), "\"[x]!\"");
    }

    #[test]
    fn test_load_commonjs_dependency_from_store() {
        let (tmp, mut host) = host();
        let store = tmp.path().join("node_modules");
        write(
            &store.join("app/index.js"),
            "module.exports = { twice: require('dep').twice };\n",
        );
        write(&store.join("dep/package.json"), r#"{"main":"main.js"}"#);
        write(
            &store.join("dep/main.js"),
            "exports.twice = function (n) { return n * 2; };\n",
        );

        let app = host
            .load_module(&store.join("app/index.js"), ModuleFormat::CommonJs)
            .unwrap()
            .into_value();
        host.bind("app", app).unwrap();
        let out = host.execute("app.twice(21)").unwrap();
        assert_eq!(out.as_number(), Some(42.0));
    }

    #[test]
    fn test_load_commonjs_reports_missing_builtin() {
        let (tmp, mut host) = host();
        let entry = tmp.path().join("node_modules/fsuser/index.js");
        write(&entry, "module.exports = require('fs');\n");

        let err = host
            .load_module(&entry, ModuleFormat::CommonJs)
            .unwrap_err();
        assert!(err.contains("fs"));
    }

    #[test]
    fn test_load_esm_namespace() {
        let (tmp, mut host) = host();
        let pkg = tmp.path().join("node_modules/esm-pkg");
        write(
            &pkg.join("index.mjs"),
            "import { base } from './base.mjs';\nexport const value = base + 1;\nexport function hello() { return 'hi'; }\n",
        );
        write(&pkg.join("base.mjs"), "export const base = 41;\n");

        let module = host
            .load_module(&pkg.join("index.mjs"), ModuleFormat::EsModule)
            .unwrap();
        let names: Vec<&str> = module.exports.iter().map(|(k, _)| k.as_str()).collect();
        assert!(names.contains(&"value"));
        assert!(names.contains(&"hello"));

        host.bind("esm", module.into_value()).unwrap();
        let out = host.execute("esm.value").unwrap();
        assert_eq!(out.as_number(), Some(42.0));
    }

    #[test]
    fn test_load_esm_default_only_is_unwrapped() {
        let (tmp, mut host) = host();
        let entry = tmp.path().join("node_modules/only-default/index.mjs");
        write(&entry, "export default function () { return 7; }\n");

        let value = host
            .load_module(&entry, ModuleFormat::EsModule)
            .unwrap()
            .into_value();
        host.bind("seven", value).unwrap();
        let out = host.execute("seven()").unwrap();
        assert_eq!(out.as_number(), Some(7.0));
    }

    #[test]
    fn test_timers_run_on_the_job_queue() {
        let (_tmp, mut host) = host();
        let promise = host
            .execute("new Promise(function (resolve) { setTimeout(resolve, 10, 'later'); })")
            .unwrap();
        match host.settle(promise, true) {
            Settlement::Fulfilled(v) => assert_eq!(host.render(&v), "\"later\""),
            other => panic!("expected fulfilment, got {other:?}"),
        }
    }

    #[test]
    fn test_process_env_comes_from_caller() {
        let tmp = tempfile::tempdir().unwrap();
        let env = BTreeMap::from([("TRYOUT_GREETING".to_string(), "hi".to_string())]);
        let mut host = JsHost::with_env(tmp.path(), &env).unwrap();

        let value = host.execute("process.env.TRYOUT_GREETING").unwrap();
        assert_eq!(host.render(&value), "\"hi\"");
        let value = host.execute("Object.keys(process.env).length").unwrap();
        assert_eq!(value.as_number(), Some(1.0));
    }
}
