//! The `Generator` trait -- the capability boundary for content backends.
//!
//! Each concrete backend (an OpenAI-compatible chat API, a scripted fake in
//! tests) implements this trait. The trait is object-safe so backends can be
//! stored as `Arc<dyn Generator>` in the [`super::GeneratorRegistry`].

use anyhow::Result;
use async_trait::async_trait;

use crate::artifact::ArtifactSet;
use crate::task::BranchInput;

/// A content backend: given structured input, produce structured output or
/// fail.
///
/// Callers treat every error uniformly; no retry or backoff contract is
/// assumed.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Human-readable name for this generator (e.g. "openai").
    fn name(&self) -> &str;

    /// Judge whether the description is a programming task.
    ///
    /// Returns the raw textual verdict; parsing is the validation stage's
    /// job.
    async fn validate(&self, task_description: &str) -> Result<String>;

    /// Propose up to `limit` distinct technology stacks for the task.
    async fn identify_stacks(&self, task_description: &str, limit: usize) -> Result<Vec<String>>;

    /// Generate the main source file for each technology of the stack.
    async fn generate_code(&self, input: &BranchInput) -> Result<ArtifactSet>;

    /// Generate the dependency manifest for each technology of the stack.
    async fn generate_dependencies(&self, input: &BranchInput) -> Result<ArtifactSet>;
}

// Compile-time assertion: Generator must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn Generator) {}
};
