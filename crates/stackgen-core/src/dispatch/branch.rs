//! A single generation branch: one stack, one backend, one result.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use futures::FutureExt;

use crate::accumulator::BranchOutcome;
use crate::artifact::ArtifactSet;
use crate::error::BranchError;
use crate::generator::Generator;
use crate::task::{BranchInput, BranchResult, GenerationMode};

use super::BranchSpec;

/// Run one branch to completion.
///
/// Never fails: any error (generator failure, deadline, unknown mode, panic)
/// is logged and recorded as an empty artifact set tagged with the backend.
pub async fn run_branch(spec: BranchSpec, timeout: Duration) -> BranchOutcome {
    let BranchSpec { id, backend, input } = spec;

    let attempt = AssertUnwindSafe(generate(backend.generator.as_ref(), &input, timeout))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(BranchError::Panicked(panic_message(panic.as_ref()))));

    let artifacts = match attempt {
        Ok(artifacts) => {
            tracing::info!(
                branch = %id,
                backend = %backend.id,
                tech_stack = %input.tech_stack,
                artifacts = artifacts.len(),
                "branch completed"
            );
            artifacts
        }
        Err(e) => {
            tracing::warn!(
                branch = %id,
                backend = %backend.id,
                tech_stack = %input.tech_stack,
                error = %e,
                "branch failed, recording empty artifact set"
            );
            ArtifactSet::empty()
        }
    };

    BranchOutcome {
        branch: id,
        result: BranchResult {
            backend_id: backend.id,
            tech_stack: input.tech_stack,
            artifacts,
        },
    }
}

async fn generate(
    generator: &dyn Generator,
    input: &BranchInput,
    timeout: Duration,
) -> Result<ArtifactSet, BranchError> {
    let call = match &input.generation_mode {
        GenerationMode::Code => generator.generate_code(input),
        GenerationMode::Dependencies => generator.generate_dependencies(input),
        GenerationMode::Unrecognized(mode) => {
            return Err(BranchError::UnrecognizedMode(mode.clone()));
        }
    };

    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(artifacts)) => Ok(artifacts),
        Ok(Err(e)) => Err(BranchError::Generator(e)),
        Err(_) => Err(BranchError::TimedOut(timeout)),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
