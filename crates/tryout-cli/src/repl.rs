//! Line-editing front end for the evaluation session.
//!
//! rustyline owns the terminal; [`Session`] owns everything else, so the
//! command handling can be driven without one.

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use std::io::Write;
use tryout_core::eval::{EvaluationOutcome, Evaluator};
use tryout_core::history::{HistoryLog, HISTORY_COMMAND};
use tryout_core::host::ScriptHost;
use tryout_core::Reporter;

use crate::ui::Output;

pub const PROMPT: &str = "> ";

const HELP: &str = "\
.exit      Exit the session
.help      Print this help message
.history   Print the input history, newest first

Press Ctrl+C to abort the current line, Ctrl+D (or .exit) to exit.";

/// Dot-commands understood by the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    History,
    Help,
    Exit,
}

impl ReplCommand {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            HISTORY_COMMAND => Some(Self::History),
            ".help" => Some(Self::Help),
            ".exit" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// What the loop should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

#[derive(Debug)]
pub struct Session<H: ScriptHost> {
    evaluator: Evaluator<H>,
    history: HistoryLog,
    output: Output,
}

impl<H: ScriptHost> Session<H> {
    pub fn new(evaluator: Evaluator<H>, history: HistoryLog, output: Output) -> Self {
        Self {
            evaluator,
            history,
            output,
        }
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Handle one accepted line, writing its result to `out`.
    ///
    /// History failures are fatal; evaluation failures are printed and the
    /// session goes on.
    pub fn handle(&mut self, line: &str, out: &mut impl Write) -> Result<Flow> {
        let input = line.trim();
        if input.is_empty() {
            return Ok(Flow::Continue);
        }

        if ReplCommand::parse(input) == Some(ReplCommand::History) {
            self.history.show(out)?;
            return Ok(Flow::Continue);
        }

        self.history.record(line)?;

        match ReplCommand::parse(input) {
            Some(ReplCommand::Exit) => return Ok(Flow::Exit),
            Some(ReplCommand::Help) => {
                writeln!(out, "{HELP}")?;
                return Ok(Flow::Continue);
            }
            Some(ReplCommand::History) | None => {}
        }

        match self.evaluator.evaluate(line) {
            EvaluationOutcome::Sync(value) | EvaluationOutcome::Settled(Ok(value)) => {
                writeln!(out, "{}", self.evaluator.render(&value))?;
            }
            EvaluationOutcome::Rejected(err) | EvaluationOutcome::Settled(Err(err)) => {
                writeln!(out, "{}", self.output.format_eval_error(&err.message))?;
            }
            EvaluationOutcome::Unsettled => {
                self.output
                    .warning("The promise is still pending and nothing is left to run it");
            }
        }
        Ok(Flow::Continue)
    }

    /// Release the history file.
    pub fn close(&mut self) {
        self.history.close();
    }
}

/// Run the prompt until `.exit` or end of input.
pub fn run<H: ScriptHost>(mut session: Session<H>) -> Result<()> {
    let mut rl: Editor<(), DefaultHistory> = Editor::new().context("Failed to create editor")?;

    for entry in session.history().entries()? {
        if let Err(e) = rl.add_history_entry(entry.as_str()) {
            tracing::warn!("Failed to add history entry: {}", e);
        }
    }

    let result = loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = rl.add_history_entry(line.as_str()) {
                        tracing::warn!("Failed to add history entry: {}", e);
                    }
                }
                let mut stdout = std::io::stdout().lock();
                match session.handle(&line, &mut stdout) {
                    Ok(Flow::Continue) => {}
                    Ok(Flow::Exit) => break Ok(()),
                    Err(e) => break Err(e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("(To exit, press Ctrl+D or type .exit)");
            }
            Err(ReadlineError::Eof) => break Ok(()),
            Err(e) => break Err(anyhow::anyhow!("Failed to read input: {e}")),
        }
    };

    session.close();
    result
}
