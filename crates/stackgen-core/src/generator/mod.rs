//! Generator interface for the content backends.
//!
//! This module defines the [`Generator`] trait that every backend adapter
//! implements, the ordered [`GeneratorRegistry`] the dispatcher fans out
//! over, and the OpenAI-compatible HTTP adapter with its presets.
//!
//! # Architecture
//!
//! ```text
//! Orchestrator
//!     |
//!     +-- primary: &dyn Generator --> validate(), identify_stacks()
//!     |
//!     v
//! GeneratorRegistry [openai, deepseek, ...]
//!     |
//!     +-- per branch --> generate_code() | generate_dependencies()
//! ```

pub mod openai;
pub mod output;
pub mod presets;
pub mod prompts;
pub mod registry;
pub mod trait_def;

// Re-export the primary public API at the module level.
pub use openai::{ChatEndpoint, OpenAiCompatibleGenerator};
pub use presets::BackendPreset;
pub use registry::{Backend, GeneratorRegistry};
pub use trait_def::Generator;
