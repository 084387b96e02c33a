use crate::error::OrchestratorError;
use crate::generator::Generator;

/// Ask the generator for up to `limit` candidate technology stacks.
///
/// Entries beyond `limit` are dropped. Distinctness is the generator's
/// responsibility and is not checked here; fewer stacks than `limit`,
/// including none, is fine.
pub async fn identify_stacks(
    generator: &dyn Generator,
    task_description: &str,
    limit: usize,
) -> Result<Vec<String>, OrchestratorError> {
    let mut stacks = generator
        .identify_stacks(task_description, limit)
        .await
        .map_err(OrchestratorError::StackIdentification)?;

    if stacks.len() > limit {
        tracing::warn!(
            generator = generator.name(),
            returned = stacks.len(),
            limit,
            "generator exceeded stack limit, truncating"
        );
        stacks.truncate(limit);
    }

    tracing::info!(
        generator = generator.name(),
        count = stacks.len(),
        "tech stacks identified"
    );
    Ok(stacks)
}
