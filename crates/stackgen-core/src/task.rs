//! Request and per-request state types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::artifact::ArtifactSet;
use crate::error::OrchestratorError;
use crate::orchestrator::Phase;

// ---------------------------------------------------------------------------
// Generation mode
// ---------------------------------------------------------------------------

/// What each generation branch is asked to produce.
///
/// Unrecognized values are carried through verbatim rather than rejected at
/// the boundary: every branch of such a request fails in isolation and
/// records an empty artifact set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GenerationMode {
    /// Main source file per technology.
    Code,
    /// Dependency manifest per technology.
    #[default]
    Dependencies,
    /// Any other value supplied by the caller.
    Unrecognized(String),
}

impl GenerationMode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Code => "code",
            Self::Dependencies => "dependencies",
            Self::Unrecognized(other) => other,
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for GenerationMode {
    fn from(s: &str) -> Self {
        match s {
            "code" => Self::Code,
            "dependencies" => Self::Dependencies,
            other => Self::Unrecognized(other.to_owned()),
        }
    }
}

impl From<String> for GenerationMode {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<GenerationMode> for String {
    fn from(mode: GenerationMode) -> Self {
        mode.as_str().to_owned()
    }
}

// ---------------------------------------------------------------------------
// Backend identity
// ---------------------------------------------------------------------------

/// Name of a configured generation backend (e.g. `openai`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendId(String);

impl BackendId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BackendId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// An incoming generation request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRequest {
    pub task_description: String,
    pub generation_mode: GenerationMode,
    /// Restrict the fan-out to these backends. `None` means every
    /// configured backend.
    pub backends: Option<Vec<BackendId>>,
}

impl TaskRequest {
    pub fn new(task_description: impl Into<String>, generation_mode: GenerationMode) -> Self {
        Self {
            task_description: task_description.into(),
            generation_mode,
            backends: None,
        }
    }

    /// Restrict the request to a subset of the configured backends.
    pub fn with_backends(mut self, backends: Vec<BackendId>) -> Self {
        self.backends = Some(backends);
        self
    }
}

/// The owned input handed to a single generation branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInput {
    pub task_description: String,
    pub generation_mode: GenerationMode,
    pub tech_stack: String,
}

/// One accumulated entry: the artifacts a backend produced for one stack.
///
/// An empty `artifacts` set marks a failed branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchResult {
    pub backend_id: BackendId,
    pub tech_stack: String,
    pub artifacts: ArtifactSet,
}

impl BranchResult {
    pub fn is_failure(&self) -> bool {
        self.artifacts.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Task state
// ---------------------------------------------------------------------------

/// State of one request, populated stage by stage.
///
/// `is_valid`, `tech_stacks` and `results` are each written at most once;
/// a second write is rejected with [`OrchestratorError::StateAlreadyWritten`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskState {
    task_description: String,
    generation_mode: GenerationMode,
    tech_stacks: Vec<String>,
    is_valid: Option<bool>,
    results: Vec<BranchResult>,
    #[serde(skip)]
    phase: Phase,
    #[serde(skip)]
    stacks_written: bool,
    #[serde(skip)]
    results_written: bool,
}

impl TaskState {
    pub fn new(request: &TaskRequest) -> Self {
        Self {
            task_description: request.task_description.clone(),
            generation_mode: request.generation_mode.clone(),
            tech_stacks: Vec::new(),
            is_valid: None,
            results: Vec::new(),
            phase: Phase::Start,
            stacks_written: false,
            results_written: false,
        }
    }

    pub fn task_description(&self) -> &str {
        &self.task_description
    }

    pub fn generation_mode(&self) -> &GenerationMode {
        &self.generation_mode
    }

    pub fn is_valid(&self) -> Option<bool> {
        self.is_valid
    }

    pub fn tech_stacks(&self) -> &[String] {
        &self.tech_stacks
    }

    /// Accumulated branch results. Physical order follows branch completion
    /// and carries no meaning.
    pub fn results(&self) -> &[BranchResult] {
        &self.results
    }

    /// The orchestrator phase this state was left in.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Results whose branch failed (empty artifact set).
    pub fn failed_results(&self) -> impl Iterator<Item = &BranchResult> {
        self.results.iter().filter(|r| r.is_failure())
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn record_verdict(&mut self, is_valid: bool) -> Result<(), OrchestratorError> {
        if self.is_valid.is_some() {
            return Err(OrchestratorError::StateAlreadyWritten("is_valid"));
        }
        self.is_valid = Some(is_valid);
        Ok(())
    }

    pub(crate) fn record_tech_stacks(&mut self, stacks: Vec<String>) -> Result<(), OrchestratorError> {
        if self.stacks_written {
            return Err(OrchestratorError::StateAlreadyWritten("tech_stacks"));
        }
        self.stacks_written = true;
        self.tech_stacks = stacks;
        Ok(())
    }

    pub(crate) fn record_results(
        &mut self,
        results: Vec<BranchResult>,
    ) -> Result<(), OrchestratorError> {
        if self.results_written {
            return Err(OrchestratorError::StateAlreadyWritten("results"));
        }
        self.results_written = true;
        self.results = results;
        Ok(())
    }
}
