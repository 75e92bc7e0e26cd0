// src/pipeline/markup.rs

//! Markup pipeline: delete stale output, minify, write.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::engine::EngineContext;
use crate::errors::Result;
use crate::pipeline::record::ToolContext;
use crate::pipeline::{clear_stale, read_records, rebase, write_records};
use crate::registry::descriptor::TaskExit;

pub async fn run(ctx: Arc<EngineContext>) -> Result<TaskExit> {
    let cfg = &*ctx.config;
    let root = Path::new(&cfg.root);
    let dest = root.join(&cfg.client.dest);
    let fs = ctx.fs.as_ref();

    clear_stale(fs, &dest, &cfg.client.html.src)?;

    let records = read_records(fs, root, &ctx.files.html.src)?;
    let tool_ctx = ToolContext {
        config: cfg,
        files: &ctx.files,
    };
    let minified = ctx.tools.html_minify.apply(records, &tool_ctx)?;
    let out = rebase(minified, &cfg.client.cwd);
    write_records(fs, &dest, &out)?;

    info!(files = out.len(), dest = %dest.display(), "markup written");
    Ok(TaskExit::Completed)
}
