//! Synchronous pre-dispatch stages: validation and stack identification.
//!
//! Both run to completion on the orchestrator's task before any branch is
//! launched, and both delegate to the primary generator.

pub mod stacks;
pub mod validation;

pub use stacks::identify_stacks;
pub use validation::{parse_verdict, run_validation};
