//! Installer adapter around the external package manager.
//!
//! The package manager runs once per missing package, to completion, with its
//! output captured. Nothing here retries.

use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

/// Captured result of one installer run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was killed by a signal or never started.
    pub exit_code: Option<i32>,
    pub failed: bool,
}

impl InstallOutput {
    /// Output for a process that could not be spawned at all.
    pub fn spawn_error(err: &std::io::Error) -> Self {
        Self {
            stdout: String::new(),
            stderr: err.to_string(),
            exit_code: None,
            failed: true,
        }
    }
}

#[async_trait]
pub trait Installer: Send + Sync {
    /// Install `target` (`name` or `name@range`) into `install_root`.
    async fn install(&self, target: &str, install_root: &Path) -> InstallOutput;
}

/// Runs `npm install --omit=dev --prefix <root> <target>`.
#[derive(Debug, Clone)]
pub struct NpmInstaller {
    program: PathBuf,
}

impl NpmInstaller {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Resolve `program` on `PATH`, keeping it as given when it is not found
    /// so the spawn error surfaces through the normal failure path.
    pub fn locate(program: &Path) -> Self {
        match which::which(program) {
            Ok(found) => Self::new(found),
            Err(e) => {
                tracing::warn!("Could not locate {}: {e}", program.display());
                Self::new(program)
            }
        }
    }

    /// Arguments for a production-only install into the cache root.
    pub fn args(target: &str, install_root: &Path) -> Vec<OsString> {
        vec![
            "install".into(),
            "--omit=dev".into(),
            "--no-audit".into(),
            "--no-fund".into(),
            "--prefix".into(),
            install_root.as_os_str().to_owned(),
            target.into(),
        ]
    }
}

#[async_trait]
impl Installer for NpmInstaller {
    async fn install(&self, target: &str, install_root: &Path) -> InstallOutput {
        let args = Self::args(target, install_root);
        tracing::debug!(program = %self.program.display(), ?args, "running installer");

        let result = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        match result {
            Ok(output) => InstallOutput {
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                exit_code: output.status.code(),
                failed: !output.status.success(),
            },
            Err(e) => InstallOutput::spawn_error(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_target_cache_root() {
        let args = NpmInstaller::args("left-pad@1", Path::new("/c"));
        let args: Vec<String> = args
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args[0], "install");
        assert!(args.contains(&"--omit=dev".to_string()));
        let prefix = args.iter().position(|a| a == "--prefix").unwrap();
        assert_eq!(args[prefix + 1], "/c");
        assert_eq!(args.last().unwrap(), "left-pad@1");
    }

    #[tokio::test]
    async fn test_missing_program_reports_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let installer = NpmInstaller::new(tmp.path().join("no-such-npm"));
        let out = installer.install("left-pad", tmp.path()).await;
        assert!(out.failed);
        assert_eq!(out.exit_code, None);
        assert!(!out.stderr.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_captured() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::tempdir().unwrap();
        let script = tmp.path().join("fake-npm");
        std::fs::write(&script, "#!/bin/sh\necho installing\necho 'npm ERR! 404' >&2\nexit 3\n")
            .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let out = NpmInstaller::new(&script).install("nope", tmp.path()).await;
        assert!(out.failed);
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stdout, "installing\n");
        assert!(out.stderr.contains("404"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_abandoned_install_is_killed() {
        use std::os::unix::fs::PermissionsExt;
        use std::time::Duration;

        let tmp = tempfile::tempdir().unwrap();
        let marker = tmp.path().join("finished");
        let script = tmp.path().join("slow-npm");
        std::fs::write(&script, format!("#!/bin/sh\nsleep 1\ntouch '{}'\n", marker.display()))
            .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let installer = NpmInstaller::new(&script);
        let abandoned =
            tokio::time::timeout(Duration::from_millis(100), installer.install("slow", tmp.path())).await;
        assert!(abandoned.is_err());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists());
    }
}
