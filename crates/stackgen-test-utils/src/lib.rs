//! Shared test utilities for stackgen tests.
//!
//! Provides [`ScriptedGenerator`], a [`Generator`] whose every answer is
//! configured up front, plus helpers for building registries and
//! orchestrators out of them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use stackgen_core::artifact::{Artifact, ArtifactSet, CodeBlock};
use stackgen_core::generator::{Generator, GeneratorRegistry};
use stackgen_core::orchestrator::{Orchestrator, OrchestratorConfig};
use stackgen_core::task::{BranchInput, GenerationMode};

/// How a scripted call behaves.
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Answer immediately.
    Succeed,
    /// Answer after the given delay.
    Delay(Duration),
    /// Return an error.
    Fail,
    /// Never answer.
    Hang,
    /// Panic inside the call.
    Panic,
}

/// A generator with scripted answers.
///
/// Defaults: verdict `"true"`, stacks `["Stack A", "Stack B"]`, and every
/// generation call succeeds with one artifact per call.
pub struct ScriptedGenerator {
    name: String,
    verdict: String,
    stacks: Vec<String>,
    validation: Behavior,
    identification: Behavior,
    generation: Behavior,
    calls: Arc<Mutex<Vec<BranchInput>>>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl ScriptedGenerator {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verdict: "true".to_string(),
            stacks: vec!["Stack A".to_string(), "Stack B".to_string()],
            validation: Behavior::Succeed,
            identification: Behavior::Succeed,
            generation: Behavior::Succeed,
            calls: Arc::new(Mutex::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Set the raw verdict text returned by `validate`.
    pub fn with_verdict(mut self, verdict: impl Into<String>) -> Self {
        self.verdict = verdict.into();
        self
    }

    /// Set the stacks returned by `identify_stacks` (returned as-is,
    /// ignoring the limit).
    pub fn with_stacks(mut self, stacks: &[&str]) -> Self {
        self.stacks = stacks.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_validation(mut self, behavior: Behavior) -> Self {
        self.validation = behavior;
        self
    }

    pub fn with_identification(mut self, behavior: Behavior) -> Self {
        self.identification = behavior;
        self
    }

    pub fn with_generation(mut self, behavior: Behavior) -> Self {
        self.generation = behavior;
        self
    }

    /// Shared log of every generation call's input.
    pub fn calls(&self) -> Arc<Mutex<Vec<BranchInput>>> {
        Arc::clone(&self.calls)
    }

    /// Shared counter of the most generation calls seen running at once.
    pub fn peak_in_flight(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.peak_in_flight)
    }

    async fn behave(&self, behavior: &Behavior, what: &str) -> Result<()> {
        match behavior {
            Behavior::Succeed => Ok(()),
            Behavior::Delay(d) => {
                tokio::time::sleep(*d).await;
                Ok(())
            }
            Behavior::Fail => Err(anyhow!("{} {what} failed (scripted)", self.name)),
            Behavior::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
            Behavior::Panic => panic!("{} {what} panicked (scripted)", self.name),
        }
    }

    async fn generate(&self, input: &BranchInput) -> Result<ArtifactSet> {
        self.calls
            .lock()
            .expect("calls mutex poisoned")
            .push(input.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let outcome = self.behave(&self.generation, "generation").await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        outcome?;

        let filename = match input.generation_mode {
            GenerationMode::Dependencies => Some("deps.txt".to_string()),
            _ => None,
        };
        Ok(ArtifactSet::new(vec![Artifact {
            technology: input.tech_stack.clone(),
            blocks: vec![CodeBlock {
                filename,
                code: format!("// {} for {}", self.name, input.tech_stack),
            }],
        }]))
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    fn name(&self) -> &str {
        &self.name
    }

    async fn validate(&self, _task_description: &str) -> Result<String> {
        self.behave(&self.validation, "validation").await?;
        Ok(self.verdict.clone())
    }

    async fn identify_stacks(&self, _task_description: &str, _limit: usize) -> Result<Vec<String>> {
        self.behave(&self.identification, "stack identification").await?;
        Ok(self.stacks.clone())
    }

    async fn generate_code(&self, input: &BranchInput) -> Result<ArtifactSet> {
        self.generate(input).await
    }

    async fn generate_dependencies(&self, input: &BranchInput) -> Result<ArtifactSet> {
        self.generate(input).await
    }
}

/// Build a registry of succeeding generators with the given names.
pub fn registry_of(names: &[&str]) -> GeneratorRegistry {
    let mut registry = GeneratorRegistry::new();
    for name in names {
        registry.register(ScriptedGenerator::new(*name));
    }
    registry
}

/// Build an orchestrator from a primary generator and a registry, with a
/// short branch timeout suitable for tests.
pub fn orchestrator(
    primary: ScriptedGenerator,
    registry: GeneratorRegistry,
    stack_limit: usize,
) -> Orchestrator {
    Orchestrator::new(
        Arc::new(primary),
        Arc::new(registry),
        OrchestratorConfig {
            stack_limit,
            branch_timeout: Duration::from_secs(5),
            max_in_flight: 8,
        },
    )
}
