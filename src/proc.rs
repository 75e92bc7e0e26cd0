// src/proc.rs

//! Process-manager capability: package-manager operations and subordinate
//! process spawning.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Command as StdCommand;

use anyhow::Context;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::model::PackageManagerSection;
use crate::errors::Result;

/// Handle to a spawned subordinate process.
pub trait ManagedProcess: Send {
    /// Wait for the process to finish; resolves to its exit code.
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + '_>>;

    /// Kill the process.
    fn kill(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Package-manager and process operations consumed by the engine.
///
/// Install, prune and detached runs are synchronous on purpose: they block
/// the control thread so a rebuild can never race an in-progress manifest
/// change.
pub trait ProcessManager: Send + Sync {
    fn install(&self) -> Result<i32>;
    fn prune(&self) -> Result<i32>;
    fn install_libraries(&self) -> Result<i32>;

    /// Run a command to completion in a fresh process, returning its exit
    /// code.
    fn run_detached(&self, command: &str, cwd: &Path) -> Result<i32>;

    /// Spawn a long-running subordinate process.
    fn spawn(&self, command: &str, cwd: &Path) -> Result<Box<dyn ManagedProcess>>;
}

/// Production implementation backed by the system shell.
pub struct SystemProcessManager {
    commands: PackageManagerSection,
    cwd: PathBuf,
}

impl SystemProcessManager {
    pub fn new(commands: PackageManagerSection, cwd: impl Into<PathBuf>) -> Self {
        Self {
            commands,
            cwd: cwd.into(),
        }
    }

    fn run_blocking(&self, command: &str, cwd: &Path) -> Result<i32> {
        info!(%command, "running blocking command");
        let status = shell_command_std(command)
            .current_dir(cwd)
            .status()
            .with_context(|| format!("running '{command}'"))?;
        let code = status.code().unwrap_or(-1);
        debug!(%command, code, "blocking command finished");
        Ok(code)
    }
}

impl ProcessManager for SystemProcessManager {
    fn install(&self) -> Result<i32> {
        self.run_blocking(&self.commands.install, &self.cwd)
    }

    fn prune(&self) -> Result<i32> {
        self.run_blocking(&self.commands.prune, &self.cwd)
    }

    fn install_libraries(&self) -> Result<i32> {
        self.run_blocking(&self.commands.install_libraries, &self.cwd)
    }

    fn run_detached(&self, command: &str, cwd: &Path) -> Result<i32> {
        self.run_blocking(command, cwd)
    }

    fn spawn(&self, command: &str, cwd: &Path) -> Result<Box<dyn ManagedProcess>> {
        info!(%command, "spawning subordinate process");
        let mut cmd = shell_command_tokio(command);
        cmd.current_dir(cwd).kill_on_drop(true);
        let child = cmd
            .spawn()
            .with_context(|| format!("spawning '{command}'"))?;
        Ok(Box::new(SystemProcess { child }))
    }
}

struct SystemProcess {
    child: tokio::process::Child,
}

impl ManagedProcess for SystemProcess {
    fn wait(&mut self) -> Pin<Box<dyn Future<Output = Result<i32>> + Send + '_>> {
        Box::pin(async move {
            let status = self
                .child
                .wait()
                .await
                .context("waiting for subordinate process")?;
            Ok(status.code().unwrap_or(-1))
        })
    }

    fn kill(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            self.child
                .kill()
                .await
                .context("killing subordinate process")?;
            Ok(())
        })
    }
}

/// Build a platform-appropriate shell invocation.
fn shell_command_std(command: &str) -> StdCommand {
    if cfg!(windows) {
        let mut cmd = StdCommand::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    } else {
        let mut cmd = StdCommand::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
}

fn shell_command_tokio(command: &str) -> Command {
    if cfg!(windows) {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C").arg(command);
        cmd
    } else {
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command);
        cmd
    }
}
