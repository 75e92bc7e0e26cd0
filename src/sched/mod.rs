// src/sched/mod.rs

//! Scheduler capability consumed by the engine core.
//!
//! The engine declares tasks against this contract and trusts it for
//! dependency resolution and at-least-once invocation semantics; it never
//! orders or executes anything itself. [`exec`] provides the default
//! in-process implementation, with its `notify`-backed watch primitive in
//! [`watcher`].

pub mod exec;
pub mod watcher;

use std::any::Any;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use crate::errors::Result;
use crate::registry::descriptor::{TaskDescriptor, TaskFuture};

pub use exec::ExecScheduler;

/// Callback invoked with a changed path, relative to the watch root.
pub type WatchCallback = Arc<dyn Fn(&Path) + Send + Sync>;

/// Keeps a watch binding alive; dropping it tears the binding down.
pub struct WatchGuard {
    _keepalive: Box<dyn Any + Send>,
}

impl WatchGuard {
    pub fn new(keepalive: Box<dyn Any + Send>) -> Self {
        Self {
            _keepalive: keepalive,
        }
    }

    /// Guard with nothing to keep alive (used by test fakes).
    pub fn noop() -> Self {
        Self {
            _keepalive: Box::new(()),
        }
    }
}

impl fmt::Debug for WatchGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchGuard").finish()
    }
}

/// External scheduler contract.
///
/// Same-name invocations are expected to be serialized by the
/// implementation; overlapping watch triggers for one task must not
/// interleave its artifact writes.
pub trait Scheduler: Send + Sync {
    /// Register a task under its (already qualified) name.
    fn define_task(&self, task: TaskDescriptor) -> Result<()>;

    /// Run a task after its transitive dependencies have completed.
    fn run_task(&self, name: &str) -> TaskFuture;

    /// Invoke `on_change` for every changed path matching `patterns`.
    fn watch(&self, patterns: Vec<String>, on_change: WatchCallback) -> Result<WatchGuard>;
}
