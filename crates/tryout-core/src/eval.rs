//! Interactive evaluator.
//!
//! Every input runs against the one host the evaluator owns, so bindings
//! from the loader and from earlier inputs stay visible. The produced value
//! is classified by what it can do:
//!
//! ```text
//! no `then`                     -> Tier::Immediate  -> Sync
//! native promise with `catch`   -> Tier::Awaitable  -> Settled(Ok | Err) / Unsettled
//! anything else with `then`     -> Tier::Thenable   -> Settled(Ok) / Unsettled
//! ```
//!
//! Thenables only get a success continuation, so their rejections are never
//! observed and end up `Unsettled`.

use std::sync::Arc;

use crate::host::{Capabilities, ScriptHost, Settlement};
use crate::loader::PackageRecord;
use crate::{EvalError, Reporter};

/// Completion protocol selected for a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Immediate,
    Thenable,
    Awaitable,
}

impl Tier {
    pub fn classify(caps: Capabilities) -> Self {
        if !caps.has_then {
            Self::Immediate
        } else if caps.native && caps.has_catch {
            Self::Awaitable
        } else {
            Self::Thenable
        }
    }
}

/// Exactly one of these is delivered per input.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome<V> {
    /// The input completed without producing a promise-like value.
    Sync(V),
    /// The input threw while running.
    Rejected(EvalError),
    /// A promise-like value settled.
    Settled(Result<V, EvalError>),
    /// A promise-like value was still pending once no work was left.
    Unsettled,
}

pub struct Evaluator<H: ScriptHost> {
    host: H,
    reporter: Arc<dyn Reporter>,
}

impl<H: ScriptHost> std::fmt::Debug for Evaluator<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evaluator").finish_non_exhaustive()
    }
}

impl<H: ScriptHost> Evaluator<H> {
    pub fn new(host: H, reporter: Arc<dyn Reporter>) -> Self {
        Self { host, reporter }
    }

    /// Seed the session with loaded packages. A later record with the same
    /// alias replaces an earlier one.
    pub fn bind_records(
        &mut self,
        records: impl IntoIterator<Item = PackageRecord<H::Value>>,
    ) -> Result<(), EvalError> {
        for record in records {
            self.host.bind(record.alias.as_str(), record.value)?;
            self.reporter.bound(&record.name, &record.alias);
        }
        Ok(())
    }

    pub fn evaluate(&mut self, source: &str) -> EvaluationOutcome<H::Value> {
        let value = match self.host.execute(source) {
            Ok(value) => value,
            Err(err) => return EvaluationOutcome::Rejected(err),
        };

        let caps = self.host.capabilities(&value);
        let tier = Tier::classify(caps);
        tracing::debug!(?caps, ?tier, "classified result");

        let wire_rejection = match tier {
            Tier::Immediate => return EvaluationOutcome::Sync(value),
            Tier::Thenable => false,
            Tier::Awaitable => true,
        };

        self.reporter.pending();
        match self.host.settle(value, wire_rejection) {
            Settlement::Fulfilled(v) => EvaluationOutcome::Settled(Ok(v)),
            Settlement::Rejected(e) => EvaluationOutcome::Settled(Err(e)),
            Settlement::Pending => EvaluationOutcome::Unsettled,
        }
    }

    pub fn render(&mut self, value: &H::Value) -> String {
        self.host.render(value)
    }
}
