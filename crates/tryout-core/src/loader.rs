//! Package loader and batch loader.
//!
//! `load` takes one request from the cache probe through to a bound value:
//!
//! 1. probe `<root>/node_modules/<name>`; install it when absent
//! 2. read the manifest (local file first, registry as fallback)
//! 3. infer the entry file and resolve it to an absolute path
//! 4. hand the path to the host and normalize what it exports
//!
//! The host is shared through a `RefCell` and only borrowed for the final
//! synchronous load, so concurrent loads never hold a borrow across an await.
//! Installs share one prefix and are serialized by `install_lock`; every
//! other step of a batch runs concurrently.

use futures::future::try_join_all;
use std::cell::RefCell;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tryout_schema::{Alias, PackageManifest, PackageName, PackageRequest};

use crate::host::{resolve, ModuleHost};
use crate::install::{Installer, NpmInstaller};
use crate::registry::{HttpRegistry, Registry};
use crate::{paths, Reporter, Settings, TryoutError};

/// A loaded package, ready to be bound into the session.
#[derive(Debug, Clone)]
pub struct PackageRecord<V> {
    pub name: PackageName,
    pub alias: Alias,
    pub value: V,
    pub version: Option<String>,
}

pub struct PackageLoader {
    install_root: PathBuf,
    installer: Arc<dyn Installer>,
    registry: Arc<dyn Registry>,
    reporter: Arc<dyn Reporter>,
    install_lock: Mutex<()>,
}

impl fmt::Debug for PackageLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackageLoader")
            .field("install_root", &self.install_root)
            .finish_non_exhaustive()
    }
}

impl PackageLoader {
    pub fn new(
        install_root: PathBuf,
        installer: Arc<dyn Installer>,
        registry: Arc<dyn Registry>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            install_root,
            installer,
            registry,
            reporter,
            install_lock: Mutex::new(()),
        }
    }

    /// Loader backed by the real package manager and HTTP registry.
    pub fn from_settings(settings: &Settings, reporter: Arc<dyn Reporter>) -> Self {
        Self::new(
            settings.install_root.clone(),
            Arc::new(NpmInstaller::locate(&settings.npm)),
            Arc::new(HttpRegistry::new(settings.registry.clone())),
            reporter,
        )
    }

    /// Load one package, installing it first if the cache lacks it.
    pub async fn load<H: ModuleHost>(
        &self,
        request: &PackageRequest,
        host: &RefCell<H>,
    ) -> Result<PackageRecord<H::Value>, TryoutError> {
        let name = &request.name;
        let dir = paths::package_dir(&self.install_root, name.as_str());

        if paths::exists(&dir) {
            self.reporter.cache_hit(name);
        } else {
            self.install(request).await?;
        }

        let manifest = self.manifest(request, &dir).await?;
        let entry = manifest.entry_point();
        let joined = resolve::normalize(&dir.join(&entry));
        let path = resolve::resolve_path(&joined).unwrap_or(joined);
        let format = manifest.module_format(&path.to_string_lossy());
        tracing::debug!(
            package = %name,
            %entry,
            path = %path.display(),
            ?format,
            "inferred entry point"
        );

        let loaded = host
            .borrow_mut()
            .load_module(&path, format)
            .map_err(|reason| TryoutError::LoadFailed {
                name: name.to_string(),
                path: path.clone(),
                reason,
            })?;

        Ok(PackageRecord {
            name: name.clone(),
            alias: request.alias.clone(),
            value: loaded.into_value(),
            version: manifest.version,
        })
    }

    /// Load every request concurrently. The first failure fails the batch.
    pub async fn load_all<H: ModuleHost>(
        &self,
        requests: &[PackageRequest],
        host: &RefCell<H>,
    ) -> Result<Vec<PackageRecord<H::Value>>, TryoutError> {
        try_join_all(requests.iter().map(|request| self.load(request, host))).await
    }

    async fn install(&self, request: &PackageRequest) -> Result<(), TryoutError> {
        let name = &request.name;
        self.reporter.installing(name);
        std::fs::create_dir_all(&self.install_root)?;

        let output = {
            let _guard = self.install_lock.lock().await;
            self.installer
                .install(&request.install_target(), &self.install_root)
                .await
        };

        if output.failed {
            self.reporter.install_failed(name, &output.stderr);
            return Err(TryoutError::InstallationFailed {
                name: name.to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr,
            });
        }

        self.reporter.installed(name, &output.stdout);
        Ok(())
    }

    async fn manifest(
        &self,
        request: &PackageRequest,
        dir: &Path,
    ) -> Result<PackageManifest, TryoutError> {
        let manifest_path = dir.join("package.json");
        let local = std::fs::read(&manifest_path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| PackageManifest::from_slice(&bytes).map_err(|e| e.to_string()));

        match local {
            Ok(manifest) => Ok(manifest),
            Err(reason) => {
                tracing::warn!(
                    path = %manifest_path.display(),
                    %reason,
                    "local manifest unusable, asking the registry"
                );
                self.registry
                    .fetch(&request.name, request.version.as_deref())
                    .await
            }
        }
    }
}
