// src/pipeline/docs.rs

//! Documentation and changelog generation. Both are one-shot,
//! order-independent tasks.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::engine::EngineContext;
use crate::errors::Result;
use crate::pipeline::record::ToolContext;
use crate::pipeline::{concat, read_records, write_records};
use crate::registry::descriptor::TaskExit;

/// Body of the `docs` task: concatenate documented sources into one
/// generated document.
pub async fn run_docs(ctx: Arc<EngineContext>) -> Result<TaskExit> {
    let cfg = &*ctx.config;
    let root = Path::new(&cfg.root);
    let fs = ctx.fs.as_ref();

    let mut patterns = ctx.files.scripts.src.clone();
    patterns.extend(cfg.server.watch.iter().cloned());

    let records = read_records(fs, root, &patterns)?;
    let tool_ctx = ToolContext {
        config: cfg,
        files: &ctx.files,
    };
    let blocks = ctx.tools.docs.apply(records, &tool_ctx)?;
    let document = concat(&blocks, "api.md");

    let dest = root.join(&cfg.client.dest).join("docs");
    write_records(fs, &dest, &[document])?;

    info!(sections = blocks.len(), dest = %dest.display(), "documentation written");
    Ok(TaskExit::Completed)
}

/// Body of the `changelog` task: regenerate the changelog with the
/// configured generator tool.
pub async fn run_changelog(ctx: Arc<EngineContext>) -> Result<TaskExit> {
    let cfg = &*ctx.config;
    let root = Path::new(&cfg.root);

    let tool_ctx = ToolContext {
        config: cfg,
        files: &ctx.files,
    };
    let generated = ctx.tools.changelog.apply(Vec::new(), &tool_ctx)?;
    write_records(ctx.fs.as_ref(), root, &generated)?;

    info!(files = generated.len(), "changelog regenerated");
    Ok(TaskExit::Completed)
}
