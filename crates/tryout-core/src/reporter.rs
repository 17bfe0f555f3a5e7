//! Reporter trait for dependency injection
//!
//! This trait allows the loader and the evaluator to report progress and status
//! without being coupled to a specific terminal implementation.

use tryout_schema::{Alias, PackageName};

pub trait Reporter: Send + Sync {
    /// A package directory was found in the cache.
    fn cache_hit(&self, name: &PackageName);

    /// A package is missing and the installer is about to run.
    fn installing(&self, name: &PackageName);

    /// The installer finished; `output` is its captured stdout.
    fn installed(&self, name: &PackageName, output: &str);

    /// The installer failed; `stderr` is its captured error stream.
    fn install_failed(&self, name: &PackageName, stderr: &str);

    /// A loaded package was bound into the session.
    fn bound(&self, name: &PackageName, alias: &Alias);

    /// An evaluation returned a promise-like value and is waiting on it.
    fn pending(&self);

    /// Log an informational message.
    fn info(&self, msg: &str);

    /// Log a success message.
    fn success(&self, msg: &str);

    /// Log a warning message.
    fn warning(&self, msg: &str);

    /// Log an error message.
    fn error(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn cache_hit(&self, name: &PackageName) {
        (**self).cache_hit(name);
    }
    fn installing(&self, name: &PackageName) {
        (**self).installing(name);
    }
    fn installed(&self, name: &PackageName, output: &str) {
        (**self).installed(name, output);
    }
    fn install_failed(&self, name: &PackageName, stderr: &str) {
        (**self).install_failed(name, stderr);
    }
    fn bound(&self, name: &PackageName, alias: &Alias) {
        (**self).bound(name, alias);
    }
    fn pending(&self) {
        (**self).pending();
    }
    fn info(&self, msg: &str) {
        (**self).info(msg);
    }
    fn success(&self, msg: &str) {
        (**self).success(msg);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
    fn error(&self, msg: &str) {
        (**self).error(msg);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn cache_hit(&self, _: &PackageName) {}
    fn installing(&self, _: &PackageName) {}
    fn installed(&self, _: &PackageName, _: &str) {}
    fn install_failed(&self, _: &PackageName, _: &str) {}
    fn bound(&self, _: &PackageName, _: &Alias) {}
    fn pending(&self) {}
    fn info(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warning(&self, _: &str) {}
    fn error(&self, _: &str) {}
}
