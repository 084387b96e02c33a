//! `stackgen ask`: run a single task in-process and print the result.

use anyhow::{Context, Result, bail};

use stackgen_core::orchestrator::Orchestrator;
use stackgen_core::task::{BackendId, GenerationMode, TaskRequest};

pub async fn run_ask(
    orchestrator: &Orchestrator,
    task_description: &str,
    mode: &str,
    backends: Option<Vec<String>>,
) -> Result<()> {
    let mut request = TaskRequest::new(task_description, GenerationMode::from(mode));
    if let Some(names) = backends {
        if names.is_empty() {
            bail!("--only must name at least one configured backend");
        }
        request = request.with_backends(names.into_iter().map(BackendId::new).collect());
    }

    let state = orchestrator.run(&request).await.context("task failed")?;

    let failed = state.failed_results().count();
    if failed > 0 {
        tracing::warn!(
            failed,
            total = state.results().len(),
            "some branches produced no artifacts"
        );
    }

    let json = serde_json::to_string_pretty(&state).context("failed to serialize task state")?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use stackgen_test_utils::{ScriptedGenerator, orchestrator, registry_of};

    #[tokio::test]
    async fn empty_backend_subset_is_an_error() {
        let orch = orchestrator(ScriptedGenerator::new("primary"), registry_of(&["openai"]), 2);
        let err = run_ask(&orch, "build a blog", "code", Some(Vec::new()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("--only"));
    }

    #[tokio::test]
    async fn unknown_backend_subset_is_an_error() {
        let orch = orchestrator(ScriptedGenerator::new("primary"), registry_of(&["openai"]), 2);
        let result = run_ask(&orch, "build a blog", "code", Some(vec!["nope".to_string()])).await;
        assert!(result.is_err());
    }
}
