//! Ordered registry of generation backends.

use std::fmt;
use std::sync::Arc;

use crate::error::OrchestratorError;
use crate::task::BackendId;

use super::trait_def::Generator;

/// A configured backend: its identity plus the generator behind it.
#[derive(Clone)]
pub struct Backend {
    pub id: BackendId,
    pub generator: Arc<dyn Generator>,
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Backend").field("id", &self.id).finish()
    }
}

/// The fixed set of backends a request fans out over.
///
/// Unlike a map, the registry preserves registration order so dispatch is
/// deterministic (stacks outer, backends inner, in this order).
///
/// # Example
///
/// ```ignore
/// let mut registry = GeneratorRegistry::new();
/// registry.register(openai_generator);
/// registry.register(deepseek_generator);
/// assert_eq!(registry.list(), vec!["openai", "deepseek"]);
/// ```
#[derive(Default, Clone)]
pub struct GeneratorRegistry {
    backends: Vec<Backend>,
}

impl GeneratorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generator under the name returned by [`Generator::name`].
    ///
    /// If a backend with the same name is already registered, it is replaced
    /// in place (keeping its position) and the old generator is returned.
    pub fn register(&mut self, generator: impl Generator + 'static) -> Option<Arc<dyn Generator>> {
        self.register_arc(Arc::new(generator))
    }

    /// Register an already shared generator.
    pub fn register_arc(&mut self, generator: Arc<dyn Generator>) -> Option<Arc<dyn Generator>> {
        let id = BackendId::new(generator.name());
        if let Some(existing) = self.backends.iter_mut().find(|b| b.id == id) {
            return Some(std::mem::replace(&mut existing.generator, generator));
        }
        self.backends.push(Backend { id, generator });
        None
    }

    /// Look up a generator by backend name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Generator>> {
        self.backends
            .iter()
            .find(|b| b.id.as_str() == name)
            .map(|b| &b.generator)
    }

    /// Backend names in registration order.
    pub fn list(&self) -> Vec<&str> {
        self.backends.iter().map(|b| b.id.as_str()).collect()
    }

    /// All backends in registration order.
    pub fn backends(&self) -> &[Backend] {
        &self.backends
    }

    /// Resolve a requested subset of backends.
    ///
    /// `None` selects every registered backend. The result follows the
    /// registry's order, not the request's, and ignores repeated names.
    pub fn select(&self, requested: Option<&[BackendId]>) -> Result<Vec<Backend>, OrchestratorError> {
        let Some(requested) = requested else {
            return Ok(self.backends.clone());
        };

        if let Some(unknown) = requested.iter().find(|id| self.get(id.as_str()).is_none()) {
            return Err(OrchestratorError::UnknownBackend(unknown.to_string()));
        }

        Ok(self
            .backends
            .iter()
            .filter(|b| requested.contains(&b.id))
            .cloned()
            .collect())
    }

    pub fn len(&self) -> usize {
        self.backends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backends.is_empty()
    }
}

impl fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("backends", &self.list())
            .finish()
    }
}
