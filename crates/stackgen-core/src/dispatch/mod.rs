//! Generation dispatcher: builds the (stack x backend) branch list and runs
//! it with a bounded number of branches in flight.
//!
//! Branches are spawned as independent tokio tasks. Each one reports a
//! single [`BranchOutcome`] over a channel to the accumulator, which is the
//! only state branches share.

pub mod branch;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;

use crate::accumulator::{BranchOutcome, ResultAccumulator};
use crate::error::AccumulatorError;
use crate::generator::Backend;
use crate::task::{BranchInput, BranchResult, GenerationMode};

pub use branch::run_branch;

/// Position of a branch in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchId(pub usize);

impl fmt::Display for BranchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything a branch needs, owned.
#[derive(Debug, Clone)]
pub struct BranchSpec {
    pub id: BranchId,
    pub backend: Backend,
    pub input: BranchInput,
}

/// Limits applied while branches run.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Deadline for a single generator call.
    pub branch_timeout: Duration,
    /// Maximum number of branches calling their generator at once.
    pub max_in_flight: usize,
}

/// Build the branch list: stacks in the outer loop, backends in the inner.
///
/// Every spec gets its own copy of the task description, mode and stack.
pub fn plan_branches(
    task_description: &str,
    generation_mode: &GenerationMode,
    tech_stacks: &[String],
    backends: &[Backend],
) -> Vec<BranchSpec> {
    tech_stacks
        .iter()
        .flat_map(|stack| backends.iter().map(move |backend| (stack, backend)))
        .enumerate()
        .map(|(idx, (stack, backend))| BranchSpec {
            id: BranchId(idx),
            backend: backend.clone(),
            input: BranchInput {
                task_description: task_description.to_owned(),
                generation_mode: generation_mode.clone(),
                tech_stack: stack.clone(),
            },
        })
        .collect()
}

/// Branches that have been launched but not yet collected.
///
/// Owns the branch tasks: dropping it before collection aborts every branch
/// that has not finished, including those still waiting for a permit.
#[must_use = "launched branches must be collected"]
pub struct PendingBranches {
    rx: mpsc::Receiver<BranchOutcome>,
    tasks: JoinSet<()>,
    expected: usize,
}

impl PendingBranches {
    /// Number of branches launched.
    pub fn expected(&self) -> usize {
        self.expected
    }

    /// Wait for every launched branch to report.
    pub async fn collect(self) -> Result<Vec<BranchResult>, AccumulatorError> {
        let Self {
            rx,
            mut tasks,
            expected,
        } = self;
        let results = ResultAccumulator::collect(rx, expected).await;
        // Every branch has reported or the channel closed; reap the tasks.
        while tasks.join_next().await.is_some() {}
        results
    }
}

/// Spawn one task per branch and return a handle for collecting them.
///
/// Launch happens in `specs` order. Each task waits for an in-flight permit
/// before calling its generator; completion order is unconstrained. The
/// tasks live only as long as the returned [`PendingBranches`].
pub fn launch(specs: Vec<BranchSpec>, config: &DispatchConfig) -> PendingBranches {
    let expected = specs.len();
    let semaphore = Arc::new(Semaphore::new(config.max_in_flight.max(1)));
    // Capacity covers every branch so no sender ever blocks.
    let (tx, rx) = mpsc::channel::<BranchOutcome>(expected.max(1));
    let mut tasks = JoinSet::new();

    for spec in specs {
        let semaphore = Arc::clone(&semaphore);
        let tx = tx.clone();
        let timeout = config.branch_timeout;

        tracing::debug!(
            branch = %spec.id,
            backend = %spec.backend.id,
            tech_stack = %spec.input.tech_stack,
            "launching branch"
        );

        tasks.spawn(async move {
            let permit = semaphore.acquire_owned().await.ok();
            let outcome = run_branch(spec, timeout).await;
            drop(permit);
            let _ = tx.send(outcome).await;
        });
    }

    PendingBranches {
        rx,
        tasks,
        expected,
    }
}

/// Launch the branches and wait for all of them.
pub async fn dispatch(
    specs: Vec<BranchSpec>,
    config: &DispatchConfig,
) -> Result<Vec<BranchResult>, AccumulatorError> {
    launch(specs, config).collect().await
}
