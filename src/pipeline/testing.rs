// src/pipeline/testing.rs

//! Test execution with coverage instrumentation, and the autotest loop.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::engine::EngineContext;
use crate::errors::{DevrigError, Result};
use crate::pipeline::record::ToolContext;
use crate::pipeline::{read_records, write_records};
use crate::registry::descriptor::TaskExit;
use crate::sched::WatchCallback;

/// Directory (under the engine root) holding instrumented sources and
/// coverage reports.
const COVERAGE_DIR: &str = ".devrig/coverage";

/// Body of the `test` task: instrument server sources, execute the test
/// entry point, write the coverage report. Lint has already run as a
/// dependency.
pub async fn run_test(ctx: Arc<EngineContext>) -> Result<TaskExit> {
    let cfg = &*ctx.config;
    let root = Path::new(&cfg.root);
    let fs = ctx.fs.as_ref();

    let records = read_records(fs, root, &cfg.server.watch)?;
    let tool_ctx = ToolContext {
        config: cfg,
        files: &ctx.files,
    };
    let instrumented = ctx.tools.coverage.apply(records, &tool_ctx)?;
    let staging = root.join(COVERAGE_DIR).join("instrumented");
    write_records(fs, &staging, &instrumented)?;

    let command = format!("node {}", cfg.test.main);
    info!(%command, "running test entry point");
    let mut process = ctx.processes.spawn(&command, root)?;
    let code = process.wait().await?;
    if code != 0 {
        return Err(DevrigError::ProcessError(format!(
            "test entry '{}' exited with code {code}",
            cfg.test.main
        )));
    }

    let sources: Vec<String> = instrumented
        .iter()
        .map(|r| r.path.to_string_lossy().replace('\\', "/"))
        .collect();
    let report = serde_json::json!({
        "instrumented": sources,
        "exit_code": code,
    });
    fs.write(
        &root.join(COVERAGE_DIR).join("report.json"),
        &serde_json::to_vec(&report)?,
    )?;

    info!(instrumented = sources.len(), "tests passed; coverage report written");
    Ok(TaskExit::Completed)
}

/// Body of the `autotest` task: watch server and test sources and re-run
/// the `test` task on every change. Never terminates on its own.
pub async fn run_autotest(ctx: Arc<EngineContext>) -> Result<TaskExit> {
    let cfg = &*ctx.config;

    let mut patterns = cfg.server.watch.clone();
    patterns.extend(cfg.test.watch.iter().cloned());

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<PathBuf>();
    let callback: WatchCallback = Arc::new(move |path: &Path| {
        let _ = tx.send(path.to_path_buf());
    });
    let _guard = ctx.scheduler.watch(patterns, callback)?;

    let test_task = ctx.qualified("test");
    info!(task = %test_task, "autotest watching for changes");

    while let Some(path) = rx.recv().await {
        info!(path = %path.display(), "change detected; re-running tests");
        match ctx.scheduler.run_task(&test_task).await {
            Ok(_) => {}
            Err(err) => warn!(error = %err, "test run failed; still watching"),
        }
    }

    Ok(TaskExit::Completed)
}
