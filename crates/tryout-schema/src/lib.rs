//! Plain data shared by the tryout pipeline.
//!
//! Nothing in this crate touches the filesystem or the network: it parses
//! package arguments, models `package.json` documents and decides which file
//! of a package is its entry point.

pub mod manifest;
pub mod request;

pub use manifest::{ModuleFormat, PackageManifest, DEFAULT_ENTRY};
pub use request::{Alias, PackageName, PackageRequest, RequestError, collect_requests};
