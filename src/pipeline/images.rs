// src/pipeline/images.rs

//! Image pipeline: delete stale output, optimize, write.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::paths::join_dir;
use crate::engine::EngineContext;
use crate::errors::Result;
use crate::pipeline::record::ToolContext;
use crate::pipeline::{clear_stale, read_records, rebase, write_records};
use crate::registry::descriptor::TaskExit;

pub async fn run(ctx: Arc<EngineContext>) -> Result<TaskExit> {
    let cfg = &*ctx.config;
    let root = Path::new(&cfg.root);
    let fs = ctx.fs.as_ref();
    let dest = root.join(&cfg.client.dest).join(&cfg.client.images.cwd);

    clear_stale(fs, &dest, &cfg.client.images.src)?;

    let records = read_records(fs, root, &ctx.files.images.src)?;
    let tool_ctx = ToolContext {
        config: cfg,
        files: &ctx.files,
    };
    let optimized = ctx.tools.image_optimize.apply(records, &tool_ctx)?;
    let base = join_dir(&[&cfg.client.cwd, &cfg.client.images.cwd]);
    let out = rebase(optimized, &base);
    write_records(fs, &dest, &out)?;

    info!(files = out.len(), dest = %dest.display(), "images written");
    Ok(TaskExit::Completed)
}
