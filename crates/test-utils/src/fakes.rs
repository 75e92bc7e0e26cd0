#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use globset::{Glob, GlobSet, GlobSetBuilder};
use tokio::sync::broadcast;

use devrig::dev::LiveReload;
use devrig::errors::{DevrigError, Result};
use devrig::proc::{ManagedProcess, ProcessManager};
use devrig::registry::{TaskBody, TaskDescriptor, TaskFuture};
use devrig::sched::{Scheduler, WatchCallback, WatchGuard};

/// A fake scheduler that:
/// - records defined tasks and run invocations
/// - invokes bodies directly, without dependency ordering
/// - lets tests fire watch events by path.
#[derive(Default)]
pub struct FakeScheduler {
    defined: Mutex<Vec<(String, Vec<String>)>>,
    bodies: Mutex<HashMap<String, TaskBody>>,
    runs: Mutex<Vec<String>>,
    watches: Mutex<Vec<FakeWatchBinding>>,
}

struct FakeWatchBinding {
    patterns: Vec<String>,
    matcher: GlobSet,
    callback: WatchCallback,
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names and dependency lists passed to `define_task`, in order.
    pub fn defined(&self) -> Vec<(String, Vec<String>)> {
        self.defined.lock().unwrap().clone()
    }

    /// Task names passed to `run_task`, in order.
    pub fn runs(&self) -> Vec<String> {
        self.runs.lock().unwrap().clone()
    }

    /// Every registered watch pattern list, in registration order.
    pub fn watch_patterns(&self) -> Vec<Vec<String>> {
        self.watches
            .lock()
            .unwrap()
            .iter()
            .map(|b| b.patterns.clone())
            .collect()
    }

    /// Fire a path against every matching watch binding; returns how many
    /// bindings matched.
    pub fn fire(&self, path: &str) -> usize {
        let callbacks: Vec<WatchCallback> = {
            let watches = self.watches.lock().unwrap();
            watches
                .iter()
                .filter(|b| b.matcher.is_match(path))
                .map(|b| Arc::clone(&b.callback))
                .collect()
        };
        for callback in &callbacks {
            callback(Path::new(path));
        }
        callbacks.len()
    }
}

impl Scheduler for FakeScheduler {
    fn define_task(&self, task: TaskDescriptor) -> Result<()> {
        self.defined
            .lock()
            .unwrap()
            .push((task.name.clone(), task.depends_on.clone()));
        self.bodies.lock().unwrap().insert(task.name, task.body);
        Ok(())
    }

    fn run_task(&self, name: &str) -> TaskFuture {
        self.runs.lock().unwrap().push(name.to_string());
        let body = self.bodies.lock().unwrap().get(name).cloned();
        let name = name.to_string();
        Box::pin(async move {
            match body {
                Some(body) => body().await,
                None => Err(DevrigError::TaskNotFound(name)),
            }
        })
    }

    fn watch(&self, patterns: Vec<String>, on_change: WatchCallback) -> Result<WatchGuard> {
        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            builder.add(Glob::new(pattern).map_err(|e| anyhow::anyhow!(e))?);
        }
        let matcher = builder.build().map_err(|e| anyhow::anyhow!(e))?;

        self.watches.lock().unwrap().push(FakeWatchBinding {
            patterns,
            matcher,
            callback: on_change,
        });
        Ok(WatchGuard::noop())
    }
}

/// A fake process manager that records operations and lets tests script
/// exit codes and subordinate process lifecycles.
pub struct FakeProcessManager {
    ops: Arc<Mutex<Vec<String>>>,
    install_code: i32,
    prune_code: i32,
    libraries_code: i32,
    detached_code: i32,
    /// When set, spawned processes exit immediately with this code;
    /// otherwise they run until `exit_subordinate` is called.
    instant_exit: Option<i32>,
    exits: broadcast::Sender<i32>,
}

impl FakeProcessManager {
    pub fn new() -> Self {
        let (exits, _) = broadcast::channel(16);
        Self {
            ops: Arc::new(Mutex::new(Vec::new())),
            install_code: 0,
            prune_code: 0,
            libraries_code: 0,
            detached_code: 0,
            instant_exit: None,
            exits,
        }
    }

    pub fn with_install_code(mut self, code: i32) -> Self {
        self.install_code = code;
        self
    }

    pub fn with_prune_code(mut self, code: i32) -> Self {
        self.prune_code = code;
        self
    }

    pub fn with_libraries_code(mut self, code: i32) -> Self {
        self.libraries_code = code;
        self
    }

    pub fn with_detached_code(mut self, code: i32) -> Self {
        self.detached_code = code;
        self
    }

    /// Spawned processes exit immediately with `code`.
    pub fn with_instant_exit(mut self, code: i32) -> Self {
        self.instant_exit = Some(code);
        self
    }

    /// Operations performed, in order: `install`, `prune`,
    /// `install_libraries`, `detached:<cmd>`, `spawn:<cmd>`, `kill`.
    pub fn operations(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    /// Make every currently-running fake process exit with `code`.
    pub fn exit_subordinate(&self, code: i32) {
        let _ = self.exits.send(code);
    }

    fn record(&self, op: impl Into<String>) {
        self.ops.lock().unwrap().push(op.into());
    }
}

impl Default for FakeProcessManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessManager for FakeProcessManager {
    fn install(&self) -> Result<i32> {
        self.record("install");
        Ok(self.install_code)
    }

    fn prune(&self) -> Result<i32> {
        self.record("prune");
        Ok(self.prune_code)
    }

    fn install_libraries(&self) -> Result<i32> {
        self.record("install_libraries");
        Ok(self.libraries_code)
    }

    fn run_detached(&self, command: &str, _cwd: &Path) -> Result<i32> {
        self.record(format!("detached:{command}"));
        Ok(self.detached_code)
    }

    fn spawn(&self, command: &str, _cwd: &Path) -> Result<Box<dyn ManagedProcess>> {
        self.record(format!("spawn:{command}"));
        Ok(Box::new(FakeProcess {
            instant_exit: self.instant_exit,
            exits: self.exits.subscribe(),
            ops: Arc::clone(&self.ops),
        }))
    }
}

/// Fake subordinate process: pends until the manager scripts an exit.
pub struct FakeProcess {
    instant_exit: Option<i32>,
    exits: broadcast::Receiver<i32>,
    ops: Arc<Mutex<Vec<String>>>,
}

impl ManagedProcess for FakeProcess {
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + '_>> {
        Box::pin(async move {
            if let Some(code) = self.instant_exit {
                return Ok(code);
            }
            match self.exits.recv().await {
                Ok(code) => Ok(code),
                Err(_) => std::future::pending().await,
            }
        })
    }

    fn kill(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.ops.lock().unwrap().push("kill".to_string());
            Ok(())
        })
    }
}

/// A fake live-reload transport recording every call.
#[derive(Default)]
pub struct FakeReload {
    listened: Mutex<Vec<u16>>,
    notifications: Mutex<Vec<Vec<PathBuf>>>,
}

impl FakeReload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn listened_ports(&self) -> Vec<u16> {
        self.listened.lock().unwrap().clone()
    }

    pub fn notifications(&self) -> Vec<Vec<PathBuf>> {
        self.notifications.lock().unwrap().clone()
    }
}

impl LiveReload for FakeReload {
    fn listen(&self, port: u16) -> Result<()> {
        self.listened.lock().unwrap().push(port);
        Ok(())
    }

    fn notify(&self, files: &[PathBuf]) -> Result<()> {
        self.notifications.lock().unwrap().push(files.to_vec());
        Ok(())
    }
}
