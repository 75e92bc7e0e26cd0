// src/dev/supervisor.rs

//! Dev-loop supervisor state machine.
//!
//! `Idle → Building → Watching → {Restarting, Exited}`. In Watching,
//! source changes re-run the matching category task, changes to the
//! engine's own configuration or the package manifests turn into restart
//! requests, and artifact changes under the destination tree are debounced
//! into live-reload notifications. There is no explicit cancel: the only
//! ways out of Watching are a restart path or the subordinate server
//! exiting.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::dev::server::{spawn_supervised, ServerEvent};
use crate::engine::EngineContext;
use crate::errors::Result;
use crate::registry::descriptor::{RestartKind, RestartRequest, TaskExit};
use crate::sched::WatchCallback;

/// Fixed debounce window between an artifact write and the live-reload
/// notification, so viewers are never notified before the writer has
/// finished flushing.
pub const RELOAD_DEBOUNCE: Duration = Duration::from_secs(1);

/// Observable supervisor states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Building,
    Watching,
    Restarting,
    Exited,
}

/// Asset categories with watch-driven rebuild tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Markup,
    Scripts,
    Styles,
    Images,
}

impl Category {
    const ALL: [Category; 4] = [
        Category::Markup,
        Category::Scripts,
        Category::Styles,
        Category::Images,
    ];

    fn task_base(self) -> &'static str {
        match self {
            Category::Markup => "html",
            Category::Scripts => "scripts",
            Category::Styles => "styles",
            Category::Images => "images",
        }
    }
}

enum DevEvent {
    Source(Category, PathBuf),
    ServerSource(PathBuf),
    EngineConfig(PathBuf),
    PackageManifest,
    LibraryManifest,
    Artifact(PathBuf),
    Server(ServerEvent),
}

/// Drives the long-running development mode for one engine instance.
pub struct DevSupervisor {
    ctx: Arc<EngineContext>,
    state: SupervisorState,
}

impl DevSupervisor {
    pub fn new(ctx: Arc<EngineContext>) -> Self {
        Self {
            ctx,
            state: SupervisorState::Idle,
        }
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    fn transition(&mut self, next: SupervisorState) {
        debug!(from = ?self.state, to = ?next, "supervisor state transition");
        self.state = next;
    }

    /// Run development mode until a restart request or the subordinate
    /// server exits.
    pub async fn run(mut self) -> Result<TaskExit> {
        let ctx = Arc::clone(&self.ctx);
        let cfg = Arc::clone(&ctx.config);

        // Initial build before watching, unless the aggregation is excluded.
        let build_task = ctx.qualified("build");
        if !ctx.exclusions.contains(&build_task) {
            self.transition(SupervisorState::Building);
            ctx.scheduler.run_task(&build_task).await?;
        } else {
            debug!(task = %build_task, "build excluded; skipping initial build");
        }

        self.transition(SupervisorState::Watching);

        let (tx, mut rx) = mpsc::unbounded_channel::<DevEvent>();
        let mut guards = Vec::new();

        // Category sources → rebuild tasks.
        for category in Category::ALL {
            let patterns = self.category_patterns(category);
            if patterns.is_empty() {
                continue;
            }
            let tx = tx.clone();
            let callback: WatchCallback = Arc::new(move |path: &Path| {
                let _ = tx.send(DevEvent::Source(category, path.to_path_buf()));
            });
            guards.push(ctx.scheduler.watch(patterns, callback)?);
        }

        // Server sources → subordinate restart.
        {
            let tx = tx.clone();
            guards.push(ctx.scheduler.watch(
                cfg.server.watch.clone(),
                Arc::new(move |path: &Path| {
                    let _ = tx.send(DevEvent::ServerSource(path.to_path_buf()));
                }),
            )?);
        }

        // The engine's own configuration → self-restart.
        if let Some(config_path) = &ctx.config_path {
            let pattern = config_path.to_string_lossy().replace('\\', "/");
            let tx = tx.clone();
            guards.push(ctx.scheduler.watch(
                vec![pattern],
                Arc::new(move |path: &Path| {
                    let _ = tx.send(DevEvent::EngineConfig(path.to_path_buf()));
                }),
            )?);
        }

        // Package manifests → reinstall + self-restart.
        {
            let tx = tx.clone();
            guards.push(ctx.scheduler.watch(
                vec![cfg.manifests.package.clone()],
                Arc::new(move |_path: &Path| {
                    let _ = tx.send(DevEvent::PackageManifest);
                }),
            )?);
        }
        {
            let tx = tx.clone();
            guards.push(ctx.scheduler.watch(
                vec![cfg.manifests.libraries.clone()],
                Arc::new(move |_path: &Path| {
                    let _ = tx.send(DevEvent::LibraryManifest);
                }),
            )?);
        }

        // Artifact tree → debounced live-reload.
        {
            let pattern = format!("{}/**/*", cfg.client.dest);
            let tx = tx.clone();
            guards.push(ctx.scheduler.watch(
                vec![pattern],
                Arc::new(move |path: &Path| {
                    let _ = tx.send(DevEvent::Artifact(path.to_path_buf()));
                }),
            )?);
        }

        // Subordinate server under restart-on-crash supervision, unless its
        // leg of the graph is excluded from this instance.
        let (restart_tx, restart_rx) = mpsc::unbounded_channel::<()>();
        let demon_task = ctx.qualified("demon");
        let _supervision = if !ctx.exclusions.contains(&demon_task) {
            let (server_tx, mut server_rx) = mpsc::unbounded_channel::<ServerEvent>();
            let forward = tx.clone();
            tokio::spawn(async move {
                while let Some(event) = server_rx.recv().await {
                    if forward.send(DevEvent::Server(event)).is_err() {
                        break;
                    }
                }
            });
            Some(spawn_supervised(Arc::clone(&ctx), server_tx, restart_rx))
        } else {
            debug!(task = %demon_task, "demon excluded; not starting subordinate server");
            None
        };

        // Viewers connect on the configured port; notifications name
        // artifact paths relative to the tree served behind it.
        ctx.reload.listen(cfg.port)?;

        let mut pending: BTreeSet<PathBuf> = BTreeSet::new();
        let mut deadline: Option<Instant> = None;

        loop {
            // `deadline` is Copy, so the debounce future owns its snapshot
            // and the event handler below can freely reschedule it.
            let debounce = async move {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                event = rx.recv() => {
                    let Some(event) = event else { break };
                    match event {
                        DevEvent::Source(category, path) => {
                            let task = ctx.qualified(category.task_base());
                            info!(task = %task, path = %path.display(), "source changed; rebuilding");
                            match ctx.scheduler.run_task(&task).await {
                                Ok(TaskExit::Completed) => {}
                                Ok(exit) => debug!(task = %task, ?exit, "unexpected exit from rebuild; ignoring"),
                                Err(err) => warn!(task = %task, error = %err, "rebuild failed; still watching"),
                            }
                        }
                        DevEvent::ServerSource(path) => {
                            debug!(path = %path.display(), "server source changed");
                            let _ = restart_tx.send(());
                        }
                        DevEvent::EngineConfig(path) => {
                            info!(path = %path.display(), "engine configuration changed; requesting restart");
                            self.transition(SupervisorState::Restarting);
                            return Ok(TaskExit::Restart(RestartRequest {
                                kind: RestartKind::EngineConfig,
                                code: 0,
                            }));
                        }
                        DevEvent::PackageManifest => {
                            self.transition(SupervisorState::Restarting);
                            return self.reinstall_and_restart();
                        }
                        DevEvent::LibraryManifest => {
                            self.transition(SupervisorState::Restarting);
                            return self.reinstall_libraries_and_rebuild();
                        }
                        DevEvent::Artifact(path) => {
                            let rel = path
                                .strip_prefix(&cfg.client.dest)
                                .map(Path::to_path_buf)
                                .unwrap_or(path);
                            pending.insert(rel);
                            deadline = Some(Instant::now() + RELOAD_DEBOUNCE);
                        }
                        DevEvent::Server(ServerEvent::Restarted) => {
                            info!("subordinate server restarted");
                        }
                        DevEvent::Server(ServerEvent::Crashed { code }) => {
                            warn!(code, "subordinate server crashed");
                        }
                        DevEvent::Server(ServerEvent::Exited { code }) => {
                            info!(code, "subordinate server exited; shutting down");
                            self.transition(SupervisorState::Exited);
                            return Ok(TaskExit::Terminated { code });
                        }
                    }
                }
                _ = debounce => {
                    let files: Vec<PathBuf> = std::mem::take(&mut pending).into_iter().collect();
                    deadline = None;
                    if let Err(err) = ctx.reload.notify(&files) {
                        warn!(error = %err, "live-reload notify failed");
                    }
                }
            }
        }

        self.transition(SupervisorState::Exited);
        Ok(TaskExit::Terminated { code: 0 })
    }

    fn category_patterns(&self, category: Category) -> Vec<String> {
        let files = &self.ctx.files;
        match category {
            Category::Markup => files.html.src.clone(),
            Category::Scripts => {
                let mut patterns = files.scripts.src.clone();
                patterns.extend(files.scripts.lib.iter().cloned());
                patterns.extend(files.templates.src.iter().cloned());
                patterns
            }
            Category::Styles => {
                let mut patterns = files.styles.src.clone();
                patterns.extend(files.style_includes.src.iter().cloned());
                patterns.extend(files.style_includes.lib.iter().cloned());
                patterns
            }
            Category::Images => files.images.src.clone(),
        }
    }

    /// Package manifest changed: reinstall, prune, ask the host to
    /// relaunch. A non-zero status halts the chain and propagates its code
    /// (fail-stop).
    fn reinstall_and_restart(&self) -> Result<TaskExit> {
        info!("package manifest changed; reinstalling dependencies");

        let code = self.ctx.processes.install()?;
        if code != 0 {
            warn!(code, "dependency install failed; aborting restart chain");
            return Ok(TaskExit::Restart(RestartRequest {
                kind: RestartKind::PackageManifest,
                code,
            }));
        }

        let code = self.ctx.processes.prune()?;
        if code != 0 {
            warn!(code, "dependency prune failed; aborting restart chain");
            return Ok(TaskExit::Restart(RestartRequest {
                kind: RestartKind::PackageManifest,
                code,
            }));
        }

        Ok(TaskExit::Restart(RestartRequest {
            kind: RestartKind::PackageManifest,
            code: 0,
        }))
    }

    /// Library manifest changed: reinstall front-end libraries, run a fresh
    /// build as a detached step, exit with that step's code.
    fn reinstall_libraries_and_rebuild(&self) -> Result<TaskExit> {
        info!("library manifest changed; reinstalling front-end libraries");

        let code = self.ctx.processes.install_libraries()?;
        if code != 0 {
            warn!(code, "library install failed; aborting restart chain");
            return Ok(TaskExit::Restart(RestartRequest {
                kind: RestartKind::LibraryManifest,
                code,
            }));
        }

        let command = fresh_build_command(&self.ctx);
        let code = self
            .ctx
            .processes
            .run_detached(&command, Path::new(&self.ctx.config.root))?;

        Ok(TaskExit::Restart(RestartRequest {
            kind: RestartKind::LibraryManifest,
            code,
        }))
    }
}

/// Command that re-runs the build in a fresh process.
fn fresh_build_command(ctx: &EngineContext) -> String {
    let exe = std::env::current_exe()
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "devrig".to_string());

    match &ctx.config_path {
        Some(path) => format!("{exe} --config {} build", path.to_string_lossy()),
        None => format!("{exe} build"),
    }
}
