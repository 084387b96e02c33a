//! Request orchestrator: validates a task, identifies stacks, fans out one
//! branch per (stack x backend) pair and collects every result.
//!
//! Phase graph:
//!
//! ```text
//! start             -> validating
//! validating        -> rejected           (is_valid = false, terminal)
//! validating        -> identifying        (is_valid = true)
//! identifying       -> dispatching
//! dispatching       -> awaiting_branches  (every branch launched)
//! awaiting_branches -> done               (every branch reported, terminal)
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::Instrument;
use uuid::Uuid;

use crate::dispatch::{self, DispatchConfig};
use crate::error::OrchestratorError;
use crate::generator::{Generator, GeneratorRegistry};
use crate::stage;
use crate::task::{TaskRequest, TaskState};

/// Where a request is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    Start,
    Validating,
    Rejected,
    Identifying,
    Dispatching,
    AwaitingBranches,
    Done,
}

impl Phase {
    /// Check whether `from -> to` is an edge of the phase graph.
    pub fn is_valid_transition(from: Phase, to: Phase) -> bool {
        matches!(
            (from, to),
            (Phase::Start, Phase::Validating)
                | (Phase::Validating, Phase::Rejected)
                | (Phase::Validating, Phase::Identifying)
                | (Phase::Identifying, Phase::Dispatching)
                | (Phase::Dispatching, Phase::AwaitingBranches)
                | (Phase::AwaitingBranches, Phase::Done)
        )
    }

    /// `Rejected` and `Done` both produce a response.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Rejected | Phase::Done)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::Validating => "validating",
            Self::Rejected => "rejected",
            Self::Identifying => "identifying",
            Self::Dispatching => "dispatching",
            Self::AwaitingBranches => "awaiting_branches",
            Self::Done => "done",
        };
        f.write_str(s)
    }
}

/// Static, process-wide settings for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on the number of stacks per request.
    pub stack_limit: usize,
    /// Deadline for each branch's generator call.
    pub branch_timeout: Duration,
    /// Maximum number of branches calling their generator at once.
    pub max_in_flight: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            stack_limit: 2,
            branch_timeout: Duration::from_secs(300),
            max_in_flight: 8,
        }
    }
}

/// Drives requests through the phase graph.
///
/// The primary generator answers validation and stack identification; the
/// registry supplies the backends branches fan out over. Both are shared
/// read-only across requests.
pub struct Orchestrator {
    primary: Arc<dyn Generator>,
    registry: Arc<GeneratorRegistry>,
    config: OrchestratorConfig,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("primary", &self.primary.name())
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}

impl Orchestrator {
    pub fn new(
        primary: Arc<dyn Generator>,
        registry: Arc<GeneratorRegistry>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            primary,
            registry,
            config,
        }
    }

    pub fn registry(&self) -> &GeneratorRegistry {
        &self.registry
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run one request to a terminal phase.
    ///
    /// Returns the final state for both `Rejected` and `Done`. Errors are
    /// request-level only: an unknown backend in the request, a generator
    /// failure or unparseable verdict during validation, or a failure during
    /// stack identification. Branch failures never surface here.
    pub async fn run(&self, request: &TaskRequest) -> Result<TaskState, OrchestratorError> {
        let span = tracing::info_span!(
            "task",
            request_id = %Uuid::new_v4(),
            mode = %request.generation_mode,
        );
        self.run_inner(request).instrument(span).await
    }

    async fn run_inner(&self, request: &TaskRequest) -> Result<TaskState, OrchestratorError> {
        let backends = self.registry.select(request.backends.as_deref())?;
        let mut state = TaskState::new(request);

        advance(&mut state, Phase::Validating)?;
        let is_valid =
            stage::run_validation(self.primary.as_ref(), &request.task_description).await?;
        state.record_verdict(is_valid)?;

        if !is_valid {
            advance(&mut state, Phase::Rejected)?;
            tracing::info!("task rejected");
            return Ok(state);
        }

        advance(&mut state, Phase::Identifying)?;
        let stacks = stage::identify_stacks(
            self.primary.as_ref(),
            &request.task_description,
            self.config.stack_limit,
        )
        .await?;
        state.record_tech_stacks(stacks)?;

        advance(&mut state, Phase::Dispatching)?;
        let specs = dispatch::plan_branches(
            state.task_description(),
            state.generation_mode(),
            state.tech_stacks(),
            &backends,
        );
        let pending = dispatch::launch(
            specs,
            &DispatchConfig {
                branch_timeout: self.config.branch_timeout,
                max_in_flight: self.config.max_in_flight,
            },
        );
        tracing::info!(
            branches = pending.expected(),
            stacks = state.tech_stacks().len(),
            backends = backends.len(),
            "branches launched"
        );

        advance(&mut state, Phase::AwaitingBranches)?;
        let results = pending.collect().await?;
        state.record_results(results)?;

        advance(&mut state, Phase::Done)?;
        tracing::info!(
            results = state.results().len(),
            failed = state.failed_results().count(),
            "task done"
        );
        Ok(state)
    }
}

fn advance(state: &mut TaskState, to: Phase) -> Result<(), OrchestratorError> {
    let from = state.phase();
    if !Phase::is_valid_transition(from, to) {
        return Err(OrchestratorError::InvalidTransition { from, to });
    }
    tracing::debug!(%from, %to, "phase transition");
    state.set_phase(to);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::GenerationMode;

    const ALL: [Phase; 7] = [
        Phase::Start,
        Phase::Validating,
        Phase::Rejected,
        Phase::Identifying,
        Phase::Dispatching,
        Phase::AwaitingBranches,
        Phase::Done,
    ];

    #[test]
    fn valid_edges_are_accepted() {
        assert!(Phase::is_valid_transition(Phase::Start, Phase::Validating));
        assert!(Phase::is_valid_transition(Phase::Validating, Phase::Rejected));
        assert!(Phase::is_valid_transition(Phase::Validating, Phase::Identifying));
        assert!(Phase::is_valid_transition(Phase::Identifying, Phase::Dispatching));
        assert!(Phase::is_valid_transition(
            Phase::Dispatching,
            Phase::AwaitingBranches
        ));
        assert!(Phase::is_valid_transition(Phase::AwaitingBranches, Phase::Done));
    }

    #[test]
    fn exactly_six_edges_exist() {
        let edges = ALL
            .iter()
            .flat_map(|from| ALL.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| Phase::is_valid_transition(*from, *to))
            .count();
        assert_eq!(edges, 6);
    }

    #[test]
    fn terminal_phases_have_no_outgoing_edges() {
        for from in ALL.iter().filter(|p| p.is_terminal()) {
            for to in ALL {
                assert!(!Phase::is_valid_transition(*from, to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn advance_rejects_skipping_phases() {
        let request = TaskRequest::new("x", GenerationMode::Code);
        let mut state = TaskState::new(&request);
        let err = advance(&mut state, Phase::Dispatching).unwrap_err();
        assert!(matches!(
            err,
            OrchestratorError::InvalidTransition {
                from: Phase::Start,
                to: Phase::Dispatching
            }
        ));
        assert_eq!(state.phase(), Phase::Start);
    }

    #[test]
    fn phase_display_is_snake_case() {
        assert_eq!(Phase::AwaitingBranches.to_string(), "awaiting_branches");
        assert_eq!(Phase::Done.to_string(), "done");
    }
}
