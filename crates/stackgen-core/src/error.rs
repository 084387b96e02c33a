//! Error types for the orchestration engine.
//!
//! Request-level failures surface as [`OrchestratorError`]. Branch-level
//! failures ([`BranchError`]) never leave the branch: they are logged and
//! converted to an empty artifact set.

use std::time::Duration;

use thiserror::Error;

use crate::dispatch::BranchId;
use crate::orchestrator::Phase;

/// The validation generator returned something other than `true`/`false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unable to parse validation verdict {0:?}: expected \"true\" or \"false\"")]
pub struct VerdictParseError(pub String);

/// Why a single generation branch produced no artifacts.
#[derive(Debug, Error)]
pub enum BranchError {
    #[error("unrecognized generation mode {0:?}")]
    UnrecognizedMode(String),
    #[error("generator call exceeded the {0:?} deadline")]
    TimedOut(Duration),
    #[error("generator failed: {0:#}")]
    Generator(anyhow::Error),
    #[error("branch panicked: {0}")]
    Panicked(String),
}

/// Problems collecting branch outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccumulatorError {
    #[error("branch {0} contributed more than once")]
    DuplicateContribution(BranchId),
    #[error("expected {expected} branch results but collected {collected}")]
    Incomplete { expected: usize, collected: usize },
}

/// Errors that terminate a request.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Verdict(#[from] VerdictParseError),
    #[error("validation generator failed: {0:#}")]
    Validation(anyhow::Error),
    #[error("stack identification failed: {0:#}")]
    StackIdentification(anyhow::Error),
    #[error("unknown backend {0:?}")]
    UnknownBackend(String),
    #[error("invalid phase transition: {from} -> {to}")]
    InvalidTransition { from: Phase, to: Phase },
    #[error("task state field `{0}` was already written")]
    StateAlreadyWritten(&'static str),
    #[error(transparent)]
    Accumulator(#[from] AccumulatorError),
}

impl OrchestratorError {
    /// Whether the error was caused by the request itself rather than a
    /// generator or the engine.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::UnknownBackend(_))
    }
}
