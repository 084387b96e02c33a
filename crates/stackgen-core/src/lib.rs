//! Task-orchestration engine for stackgen.
//!
//! A request is validated, a bounded set of candidate technology stacks is
//! identified, and one generation branch is fanned out per
//! (stack x backend) pair. Branch failures are isolated: every launched
//! branch contributes exactly one entry to the final [`task::TaskState`].
//!
//! ```text
//! Orchestrator
//!     |
//!     +--> stage::validation  (verdict -> is_valid)
//!     +--> stage::stacks      (tech_stacks, bounded by stack_limit)
//!     +--> dispatch           (stacks x backends -> branches)
//!     |        |
//!     |        +--> branch ... branch   (bounded in-flight, per-branch deadline)
//!     |                 |
//!     +--> accumulator <+   (single collector, one entry per branch)
//! ```

pub mod accumulator;
pub mod artifact;
pub mod dispatch;
pub mod error;
pub mod generator;
pub mod orchestrator;
pub mod stage;
pub mod task;
