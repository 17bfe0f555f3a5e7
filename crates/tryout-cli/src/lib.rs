//! tryout - try any npm package in a REPL
//!
//! ```text
//! tryout lodash left-pad=pad @scope/pkg@^2
//! ```
//!
//! Each package is installed into a private cache on first use, loaded from
//! its entry point and bound to a global in an embedded JavaScript session.

pub mod repl;
pub mod ui;

use anyhow::{Context, Result};
use clap::builder::FalseyValueParser;
use clap::Parser;
use std::path::PathBuf;
use tryout_core::config::DEFAULT_REGISTRY;
use tryout_core::{paths, Settings};

#[derive(Debug, Parser)]
#[command(name = "tryout")]
#[command(author, version = env!("TRYOUT_VERSION"), about = "Try any npm package in a REPL")]
pub struct Cli {
    /// Packages to load: name, name@range, either optionally followed by =alias
    pub packages: Vec<String>,

    /// Delete every cached package and exit
    #[arg(long)]
    pub clear: bool,

    /// Cache root
    #[arg(long, env = "TRYOUT_PATH")]
    pub path: Option<PathBuf>,

    /// History file (defaults to <cache root>/repl_history)
    #[arg(long, env = "TRYOUT_HISTORY_PATH")]
    pub history: Option<PathBuf>,

    /// Load the packages but do not start the prompt
    #[arg(long = "no-repl", env = "TRYOUT_NONINTERACTIVE", value_parser = FalseyValueParser::new())]
    pub no_repl: bool,

    /// Package manager executable
    #[arg(long, env = "TRYOUT_NPM", default_value = "npm")]
    pub npm: PathBuf,

    /// Registry used when a cached package has no readable manifest
    #[arg(long, env = "TRYOUT_REGISTRY", default_value = DEFAULT_REGISTRY)]
    pub registry: String,
}

impl Cli {
    pub fn settings(&self) -> Result<Settings> {
        let install_root = self
            .path
            .clone()
            .or_else(paths::try_tryout_home)
            .context("Could not determine the home directory; set TRYOUT_PATH")?;

        let mut settings = Settings::new(install_root);
        if let Some(history) = &self.history {
            settings.history_path.clone_from(history);
        }
        settings.interactive = !self.no_repl;
        settings.npm.clone_from(&self.npm);
        settings.registry.clone_from(&self.registry);
        settings.env = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        Ok(settings)
    }
}
