//! Terminal output.
//!
//! Status lines go to stdout, failures to stderr. Evaluation results are
//! written by the REPL itself so they can be captured in tests.

use crossterm::style::Stylize;
use tryout_core::Reporter;
use tryout_schema::{Alias, PackageName};

use super::Theme;

/// A cloneable handle for printing styled status messages.
#[derive(Debug, Clone, Default)]
pub struct Output {
    theme: Theme,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    /// Format an evaluation failure the way the prompt shows it.
    pub fn format_eval_error(&self, message: &str) -> String {
        format!("Uncaught {message}")
            .with(self.theme.colors.error)
            .to_string()
    }

    fn name(&self, name: &str) -> String {
        name.with(self.theme.colors.package_name).to_string()
    }
}

impl Reporter for Output {
    fn cache_hit(&self, name: &PackageName) {
        println!(
            "  {} {} found in cache",
            self.theme.icons.info,
            self.name(name.as_str())
        );
    }

    fn installing(&self, name: &PackageName) {
        println!(
            "  {} Installing {}...",
            self.theme.icons.active.with(self.theme.colors.warning),
            self.name(name.as_str())
        );
    }

    fn installed(&self, name: &PackageName, output: &str) {
        for line in output.lines().filter(|l| !l.trim().is_empty()) {
            println!("    {}", line.with(self.theme.colors.secondary));
        }
        println!(
            "  {} Installed {}",
            self.theme.icons.success.with(self.theme.colors.success),
            self.name(name.as_str())
        );
    }

    fn install_failed(&self, name: &PackageName, _stderr: &str) {
        eprintln!(
            "  {} {} failed to install",
            self.theme.icons.error.with(self.theme.colors.error),
            self.name(name.as_str())
        );
    }

    fn bound(&self, name: &PackageName, alias: &Alias) {
        println!(
            "  {} {} is available as {}",
            self.theme.icons.success.with(self.theme.colors.success),
            self.name(name.as_str()),
            alias.as_str().bold()
        );
    }

    fn pending(&self) {
        println!(
            "{} {}",
            self.theme.icons.pending.with(self.theme.colors.secondary),
            "Waiting for the promise to settle...".with(self.theme.colors.secondary)
        );
    }

    fn info(&self, msg: &str) {
        println!("  {} {msg}", self.theme.icons.info);
    }

    fn success(&self, msg: &str) {
        println!(
            "{} {}",
            self.theme.icons.success.with(self.theme.colors.success),
            msg.with(self.theme.colors.success)
        );
    }

    fn warning(&self, msg: &str) {
        println!(
            "{} {}",
            self.theme.icons.warning.with(self.theme.colors.warning),
            msg.with(self.theme.colors.warning)
        );
    }

    fn error(&self, msg: &str) {
        eprintln!(
            "{} {}",
            self.theme.icons.error.with(self.theme.colors.error),
            msg.with(self.theme.colors.error)
        );
    }
}
