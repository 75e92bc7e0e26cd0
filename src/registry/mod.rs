// src/registry/mod.rs

//! Task graph registry.
//!
//! - [`descriptor`] defines the task descriptor shape, name qualification
//!   and the task-exit vocabulary.
//! - [`exclusion`] computes which names are suppressed and provides the
//!   stub registered in their place.
//! - [`graph`] declares the fixed task set and mounts it against the
//!   scheduler capability, validating references and acyclicity.

pub mod descriptor;
pub mod exclusion;
pub mod graph;

pub use descriptor::{
    qualify, RestartKind, RestartRequest, TaskBody, TaskDescriptor, TaskExit, TaskFuture, TaskName,
};
pub use exclusion::ExclusionSet;
pub use graph::{PlanEntry, Registry, TASK_BASES};
