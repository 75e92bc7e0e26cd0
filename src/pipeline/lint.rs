// src/pipeline/lint.rs

//! Static-analysis pass over server, test and client scripts.
//!
//! Findings are reported through the logging sink and never fail the task;
//! dependents like `scripts` and `test` only require that the pass ran.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::engine::EngineContext;
use crate::errors::Result;
use crate::pipeline::read_records;
use crate::pipeline::record::ToolContext;
use crate::registry::descriptor::TaskExit;

pub async fn run(ctx: Arc<EngineContext>) -> Result<TaskExit> {
    let cfg = &*ctx.config;
    let root = Path::new(&cfg.root);

    let mut patterns = cfg.server.watch.clone();
    patterns.extend(cfg.test.watch.iter().cloned());
    patterns.extend(ctx.files.scripts.src.iter().cloned());

    let records = match read_records(ctx.fs.as_ref(), root, &patterns) {
        Ok(records) => records,
        Err(err) => {
            warn!(error = %err, "lint could not read sources; skipping pass");
            return Ok(TaskExit::Completed);
        }
    };
    let checked = records.len();

    let tool_ctx = ToolContext {
        config: cfg,
        files: &ctx.files,
    };
    match ctx.tools.lint.apply(records, &tool_ctx) {
        Ok(findings) => {
            for finding in &findings {
                warn!(file = %finding.path.display(), "lint: {}", finding.text().trim_end());
            }
            info!(files = checked, findings = findings.len(), "lint finished");
        }
        Err(err) => {
            warn!(error = %err, "lint tool failed; continuing");
        }
    }

    Ok(TaskExit::Completed)
}
