// src/dev/server.rs

//! Subordinate server process supervision.
//!
//! The server runs under a restart-on-crash loop with three observable
//! events (restarted, crashed, exited), each logged. A clean exit ends
//! supervision and is propagated to the caller; no other component may
//! signal the process.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::config::model::Configuration;
use crate::engine::EngineContext;
use crate::errors::Result;
use crate::registry::descriptor::TaskExit;

/// Observable subordinate process events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerEvent {
    Restarted,
    Crashed { code: i32 },
    Exited { code: i32 },
}

/// Spawn the restart-on-crash supervision loop.
///
/// `restart_rx` asks for the current instance to be killed and relaunched
/// (used when server sources change). Events are forwarded to `events`;
/// after `Exited` the loop ends.
pub fn spawn_supervised(
    ctx: Arc<EngineContext>,
    events: mpsc::UnboundedSender<ServerEvent>,
    mut restart_rx: mpsc::UnboundedReceiver<()>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let command = server_command(&ctx.config);
        let cwd = PathBuf::from(&ctx.config.root);
        let mut first = true;

        loop {
            if !first {
                info!("server restarted");
                let _ = events.send(ServerEvent::Restarted);
            }
            first = false;

            let mut process = match ctx.processes.spawn(&command, &cwd) {
                Ok(process) => process,
                Err(err) => {
                    error!(error = %err, "failed to spawn server");
                    let _ = events.send(ServerEvent::Exited { code: -1 });
                    return;
                }
            };

            tokio::select! {
                result = process.wait() => match result {
                    Ok(0) => {
                        info!("server exited");
                        let _ = events.send(ServerEvent::Exited { code: 0 });
                        return;
                    }
                    Ok(code) => {
                        warn!(code, "server crashed; restarting");
                        let _ = events.send(ServerEvent::Crashed { code });
                    }
                    Err(err) => {
                        error!(error = %err, "failed waiting for server");
                        let _ = events.send(ServerEvent::Exited { code: -1 });
                        return;
                    }
                },
                Some(()) = restart_rx.recv() => {
                    info!("server sources changed; restarting server");
                    if let Err(err) = process.kill().await {
                        warn!(error = %err, "failed to kill server for restart");
                    }
                }
            }
        }
    })
}

/// Command used to launch the subordinate server entry point.
pub(crate) fn server_command(cfg: &Configuration) -> String {
    format!("node {}", cfg.server.main)
}

/// Body of the `server` task: run the subordinate server once, to
/// completion, and propagate its exit code.
pub async fn run_server(ctx: Arc<EngineContext>) -> Result<TaskExit> {
    let command = server_command(&ctx.config);
    info!(%command, "starting server");

    let mut process = ctx.processes.spawn(&command, Path::new(&ctx.config.root))?;
    let code = process.wait().await?;

    info!(code, "server exited");
    Ok(TaskExit::Terminated { code })
}

/// Body of the `demon` task: the subordinate server under supervision,
/// restarted whenever server sources change.
pub async fn run_demon(ctx: Arc<EngineContext>) -> Result<TaskExit> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (restart_tx, restart_rx) = mpsc::unbounded_channel();

    let _watch = ctx.scheduler.watch(
        ctx.config.server.watch.clone(),
        Arc::new(move |_path: &Path| {
            let _ = restart_tx.send(());
        }),
    )?;
    let _supervision = spawn_supervised(Arc::clone(&ctx), event_tx, restart_rx);

    while let Some(event) = event_rx.recv().await {
        if let ServerEvent::Exited { code } = event {
            return Ok(TaskExit::Terminated { code });
        }
    }

    Ok(TaskExit::Terminated { code: -1 })
}
