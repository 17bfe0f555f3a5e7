//! tryout - try any npm package in a REPL

use anyhow::Result;
use clap::Parser;
use std::cell::RefCell;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use tryout_cli::repl::{self, Session};
use tryout_cli::ui::Output;
use tryout_cli::Cli;
use tryout_core::clear::{clear_cache, ClearOutcome};
use tryout_core::eval::Evaluator;
use tryout_core::history::HistoryLog;
use tryout_core::host::js::JsHost;
use tryout_core::{PackageLoader, Reporter, Settings, TryoutError};
use tryout_schema::collect_requests;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let bare = std::env::args_os().len() <= 1;
    let cli = Cli::parse();
    let output = Output::new();

    match run(&cli, bare, &output).await {
        Ok(code) => code,
        Err(err) => {
            output.error(&format!("{err:#}"));
            ExitCode::from(exit_status(&err))
        }
    }
}

/// `bare` is true when the binary got no arguments at all; flags alone start
/// an empty session.
async fn run(cli: &Cli, bare: bool, output: &Output) -> Result<ExitCode> {
    let settings = cli.settings()?;

    if cli.clear {
        return Ok(clear(&settings, output));
    }

    if bare {
        return Err(TryoutError::InvalidInvocation.into());
    }
    let requests = collect_requests(&cli.packages).map_err(TryoutError::from)?;

    let reporter: Arc<dyn Reporter> = Arc::new(output.clone());
    let host = RefCell::new(JsHost::with_env(&settings.install_root, &settings.env)?);
    let loader = PackageLoader::from_settings(&settings, reporter.clone());
    let records = loader.load_all(&requests, &host).await?;

    let mut evaluator = Evaluator::new(host.into_inner(), reporter);
    evaluator.bind_records(records)?;

    if !settings.interactive {
        output.info("Packages loaded; not starting the REPL");
        return Ok(ExitCode::SUCCESS);
    }

    let history = HistoryLog::attach(&settings.history_path)?;
    output.info("REPL started. Type .help for commands.");
    repl::run(Session::new(evaluator, history, output.clone()))?;
    Ok(ExitCode::SUCCESS)
}

fn clear(settings: &Settings, output: &Output) -> ExitCode {
    match clear_cache(&settings.install_root) {
        Ok(ClearOutcome::Removed) => {
            output.success("Cache successfully cleared!");
            ExitCode::SUCCESS
        }
        Ok(ClearOutcome::AlreadyClear) => {
            output.success("Cache is already empty.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            output.error(&format!("Could not remove cache! {e}"));
            ExitCode::FAILURE
        }
    }
}

/// Installer failures keep the installer's status; everything else is 1.
fn exit_status(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<TryoutError>()
        .map_or(1, TryoutError::exit_code)
        .try_into()
        .unwrap_or(1)
}
