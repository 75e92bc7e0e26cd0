// src/sched/exec.rs

//! Default in-process scheduler implementation.
//!
//! Dependencies run before their dependent; independent dependency
//! subtrees run concurrently; repeated invocations of the same name are
//! serialized behind a per-task gate. A dependency that resolves to a
//! restart request short-circuits the run without invoking the dependent's
//! body.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::errors::{DevrigError, Result};
use crate::registry::descriptor::{TaskBody, TaskDescriptor, TaskExit, TaskFuture, TaskName};
use crate::sched::{Scheduler, WatchCallback, WatchGuard};

struct Registered {
    depends_on: Vec<TaskName>,
    body: TaskBody,
    /// Serializes same-name invocations so overlapping watch triggers for
    /// one task queue up instead of interleaving writes.
    gate: Arc<tokio::sync::Mutex<()>>,
}

struct Inner {
    root: PathBuf,
    tasks: Mutex<HashMap<TaskName, Registered>>,
}

/// Dependency-ordering executor over the registered task map.
pub struct ExecScheduler {
    inner: Arc<Inner>,
}

impl ExecScheduler {
    /// `root` is the directory watch patterns are evaluated against.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                root: root.into(),
                tasks: Mutex::new(HashMap::new()),
            }),
        }
    }
}

impl Scheduler for ExecScheduler {
    fn define_task(&self, task: TaskDescriptor) -> Result<()> {
        let mut tasks = lock_tasks(&self.inner)?;
        if tasks.contains_key(&task.name) {
            return Err(DevrigError::ConfigError(format!(
                "task '{}' is already defined",
                task.name
            )));
        }

        debug!(task = %task.name, deps = ?task.depends_on, "task defined");
        tasks.insert(
            task.name.clone(),
            Registered {
                depends_on: task.depends_on,
                body: task.body,
                gate: Arc::new(tokio::sync::Mutex::new(())),
            },
        );
        Ok(())
    }

    fn run_task(&self, name: &str) -> TaskFuture {
        run_node(Arc::clone(&self.inner), name.to_string())
    }

    fn watch(&self, patterns: Vec<String>, on_change: WatchCallback) -> Result<WatchGuard> {
        crate::sched::watcher::spawn_watch(self.inner.root.clone(), patterns, on_change)
    }
}

fn lock_tasks(inner: &Inner) -> Result<std::sync::MutexGuard<'_, HashMap<TaskName, Registered>>> {
    inner
        .tasks
        .lock()
        .map_err(|_| DevrigError::ProcessError("scheduler task map lock poisoned".to_string()))
}

fn run_node(inner: Arc<Inner>, name: TaskName) -> TaskFuture {
    Box::pin(async move {
        let (depends_on, body, gate) = {
            let tasks = lock_tasks(&inner)?;
            let registered = tasks
                .get(&name)
                .ok_or_else(|| DevrigError::TaskNotFound(name.clone()))?;
            (
                registered.depends_on.clone(),
                Arc::clone(&registered.body),
                Arc::clone(&registered.gate),
            )
        };

        // Dependencies first. Independent subtrees run concurrently, and a
        // failing dependency does not halt its siblings; the first failure
        // is reported once everything has settled.
        if !depends_on.is_empty() {
            debug!(task = %name, deps = ?depends_on, "running dependencies");

            let mut handles = Vec::with_capacity(depends_on.len());
            for dep in depends_on {
                handles.push((dep.clone(), tokio::spawn(run_node(Arc::clone(&inner), dep))));
            }

            let mut restart = None;
            let mut failure = None;
            for (dep, handle) in handles {
                match handle.await {
                    Ok(Ok(TaskExit::Completed)) => {}
                    Ok(Ok(other)) => {
                        restart.get_or_insert(other);
                    }
                    Ok(Err(err)) => {
                        warn!(task = %dep, error = %err, "dependency failed");
                        failure.get_or_insert(err);
                    }
                    Err(err) => {
                        failure.get_or_insert(DevrigError::ProcessError(format!(
                            "dependency '{dep}' panicked: {err}"
                        )));
                    }
                }
            }

            if let Some(exit) = restart {
                return Ok(exit);
            }
            if let Some(err) = failure {
                return Err(err);
            }
        }

        // One instance of a given task at a time.
        let _running = gate.lock().await;
        info!(task = %name, "running task");
        (body)().await
    })
}
