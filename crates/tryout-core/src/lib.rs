//! tryout core - on-demand package loading and the evaluation session.
//!
//! # Pipeline
//!
//! ```text
//! PackageRequest --[paths::package_dir]--> cache probe
//!        |                                      |
//!        |                  absent: Installer::install
//!        v                                      v
//!  manifest (cache) / Registry::fetch --> entry_point() --> ModuleHost::load_module
//!                                                                  |
//!                                                                  v
//!                                                           PackageRecord
//! ```
//!
//! Records are bound into an [`eval::Evaluator`], which classifies each
//! result as immediate, a loose thenable or a native promise.
//!
//! # Directory Layout
//!
//! ```text
//! ~/.tryout/
//! ├── node_modules/   # dependency store managed by the package manager
//! └── repl_history    # newline-delimited session log
//! ```

pub mod clear;
pub mod config;
pub mod error;
pub mod eval;
pub mod history;
pub mod host;
pub mod install;
pub mod loader;
pub mod paths;
pub mod registry;
pub mod reporter;

pub use config::Settings;
pub use error::{EvalError, TryoutError};
pub use eval::{EvaluationOutcome, Evaluator};
pub use history::HistoryLog;
pub use loader::{PackageLoader, PackageRecord};
pub use reporter::{NullReporter, Reporter};

/// User Agent string for registry requests
pub const USER_AGENT: &str = concat!("tryout/", env!("CARGO_PKG_VERSION"));
