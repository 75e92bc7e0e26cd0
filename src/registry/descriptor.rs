// src/registry/descriptor.rs

//! Task descriptor types shared by the registry and the scheduler capability.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::errors::Result;

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Why the engine asks its host process to terminate and relaunch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartKind {
    /// The engine's own configuration file changed.
    EngineConfig,
    /// The package manifest changed; dependencies were reinstalled and
    /// pruned before the request.
    PackageManifest,
    /// The front-end library manifest changed; libraries were reinstalled
    /// and a fresh build ran as a detached step.
    LibraryManifest,
}

/// Request that the host process exits and lets an external relauncher
/// start a fresh instance.
///
/// Returned as a value instead of terminating in place, so the host decides
/// relaunch policy and tests don't have to kill their own process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartRequest {
    pub kind: RestartKind,
    /// Exit code the host should terminate with. Zero for deliberate
    /// self-restarts; non-zero when a reinstall step failed (fail-stop).
    pub code: i32,
}

/// Outcome of a task body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskExit {
    /// The task ran to completion.
    Completed,
    /// The dev-loop supervisor wants the process relaunched.
    Restart(RestartRequest),
    /// The subordinate server exited; the host should terminate with its
    /// propagated code.
    Terminated { code: i32 },
}

/// Boxed future produced by a task body.
pub type TaskFuture = Pin<Box<dyn Future<Output = Result<TaskExit>> + Send>>;

/// Opaque task body: an async callable that produces artifacts.
pub type TaskBody = Arc<dyn Fn() -> TaskFuture + Send + Sync>;

/// A named task with its upstream dependencies and body.
///
/// Dependencies are declared by name. Registration-time validation
/// guarantees that every referenced name resolves to a registered (or
/// excluded-stub) task, never a dangling one.
#[derive(Clone)]
pub struct TaskDescriptor {
    pub name: TaskName,
    pub depends_on: Vec<TaskName>,
    pub body: TaskBody,
}

impl TaskDescriptor {
    pub fn new(name: impl Into<TaskName>, depends_on: Vec<TaskName>, body: TaskBody) -> Self {
        Self {
            name: name.into(),
            depends_on,
            body,
        }
    }
}

impl fmt::Debug for TaskDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskDescriptor")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}

/// Qualify a base task name with an optional instance prefix.
///
/// Applied consistently at registration and at dependency-reference sites,
/// so a host can mount several engine instances without task-name
/// collisions.
pub fn qualify(prefix: Option<&str>, base: &str) -> TaskName {
    match prefix {
        Some(p) if !p.is_empty() => format!("{p}_{base}"),
        _ => base.to_string(),
    }
}
