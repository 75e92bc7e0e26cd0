// src/engine.rs

//! Engine instance wiring.
//!
//! One explicit context object per instance, passed to every component and
//! task body; no global mutable state, so multiple instances (e.g. under
//! test) never share sockets or registries.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::model::Configuration;
use crate::config::paths::FileSets;
use crate::dev::reload::{LiveReload, TcpReloadServer};
use crate::errors::Result;
use crate::fs::{FileSystem, RealFileSystem};
use crate::pipeline::ToolKit;
use crate::proc::{ProcessManager, SystemProcessManager};
use crate::registry::descriptor::{qualify, TaskExit, TaskName};
use crate::registry::exclusion::ExclusionSet;
use crate::registry::graph::{Registry, TASK_BASES};
use crate::sched::{ExecScheduler, Scheduler};

/// Capabilities an engine instance runs against.
///
/// Hosts (and tests) can swap any of these; [`Capabilities::default_for`]
/// builds the production set.
pub struct Capabilities {
    pub scheduler: Arc<dyn Scheduler>,
    pub tools: Arc<ToolKit>,
    pub fs: Arc<dyn FileSystem>,
    pub processes: Arc<dyn ProcessManager>,
    pub reload: Arc<dyn LiveReload>,
}

impl Capabilities {
    pub fn default_for(config: &Configuration) -> Self {
        Self {
            scheduler: Arc::new(ExecScheduler::new(&config.root)),
            tools: Arc::new(ToolKit::default()),
            fs: Arc::new(RealFileSystem),
            processes: Arc::new(SystemProcessManager::new(
                config.package_manager.clone(),
                &config.root,
            )),
            reload: Arc::new(TcpReloadServer::new()),
        }
    }
}

/// Shared, immutable state for one engine instance.
pub struct EngineContext {
    pub config: Arc<Configuration>,
    /// Path the configuration was loaded from, if any; watched for
    /// self-restart in development mode.
    pub config_path: Option<PathBuf>,
    /// File-pattern snapshot derived once at instantiation.
    pub files: Arc<FileSets>,
    pub exclusions: Arc<ExclusionSet>,
    pub tools: Arc<ToolKit>,
    pub fs: Arc<dyn FileSystem>,
    pub scheduler: Arc<dyn Scheduler>,
    pub processes: Arc<dyn ProcessManager>,
    pub reload: Arc<dyn LiveReload>,
}

impl EngineContext {
    /// Qualified task name for a base name, honouring this instance's
    /// prefix.
    pub fn qualified(&self, base: &str) -> TaskName {
        qualify(self.config.effective_prefix(), base)
    }
}

/// One engine instance: resolved configuration, derived file sets, and the
/// task registry mounted against the scheduler capability.
pub struct Engine {
    ctx: Arc<EngineContext>,
}

impl Engine {
    pub fn new(config: Configuration, config_path: Option<PathBuf>, caps: Capabilities) -> Self {
        let files = FileSets::from_config(&config);
        let exclusions = ExclusionSet::from_config(&config, &TASK_BASES);

        let ctx = Arc::new(EngineContext {
            config: Arc::new(config),
            config_path,
            files: Arc::new(files),
            exclusions: Arc::new(exclusions),
            tools: caps.tools,
            fs: caps.fs,
            scheduler: caps.scheduler,
            processes: caps.processes,
            reload: caps.reload,
        });

        Self { ctx }
    }

    /// Declare the full task graph against the scheduler capability.
    pub fn register(&self) -> Result<Registry> {
        let registry = Registry::build(&self.ctx);
        registry.mount(self.ctx.scheduler.as_ref())?;
        Ok(registry)
    }

    /// Run one task (base name, unprefixed) to completion.
    pub async fn run(&self, base: &str) -> Result<TaskExit> {
        let name = self.ctx.qualified(base);
        self.ctx.scheduler.run_task(&name).await
    }

    pub fn context(&self) -> &Arc<EngineContext> {
        &self.ctx
    }
}
