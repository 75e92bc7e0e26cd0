// src/lib.rs

pub mod cli;
pub mod config;
pub mod dev;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod proc;
pub mod registry;
pub mod sched;

use std::path::PathBuf;

use tracing::info;

use crate::cli::CliArgs;
use crate::config::loader::load_from_path;
use crate::engine::{Capabilities, Engine};
use crate::errors::Result;
use crate::registry::descriptor::TaskExit;
use crate::registry::graph::Registry;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and resolution over the defaults
/// - the engine context and its default capabilities
/// - task registration (with exclusion filtering)
/// - a single task invocation
///
/// The returned value is the exit code the host process should terminate
/// with; restart requests map to their carried code so an external process
/// manager can relaunch.
pub async fn run(args: CliArgs) -> Result<i32> {
    let config_path = PathBuf::from(&args.config);
    let config = load_from_path(&config_path)?;

    let caps = Capabilities::default_for(&config);
    let config_path = config_path.exists().then_some(config_path);
    let engine = Engine::new(config, config_path, caps);
    let registry = engine.register()?;

    if args.dry_run {
        print_dry_run(&registry);
        return Ok(0);
    }

    match engine.run(&args.task).await? {
        TaskExit::Completed => {
            info!(task = %args.task, "task completed");
            Ok(0)
        }
        TaskExit::Restart(request) => {
            info!(
                kind = ?request.kind,
                code = request.code,
                "restart requested; exiting for the process manager to relaunch"
            );
            Ok(request.code)
        }
        TaskExit::Terminated { code } => {
            info!(code, "subordinate exited; terminating");
            Ok(code)
        }
    }
}

/// Simple dry-run output: print tasks, dependencies and exclusions.
fn print_dry_run(registry: &Registry) {
    let plan = registry.plan();

    println!("devrig dry-run");
    println!("tasks ({}):", plan.len());
    for entry in plan {
        let marker = if entry.excluded { "  (excluded)" } else { "" };
        println!("  - {}{marker}", entry.name);
        if !entry.depends_on.is_empty() {
            println!("      after: {:?}", entry.depends_on);
        }
    }
}
