// src/pipeline/styles.rs

//! Style pipeline: compile (with library and source include paths), apply
//! vendor prefixes, concatenate, minify, and write bundle plus source map.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::engine::EngineContext;
use crate::errors::Result;
use crate::pipeline::record::ToolContext;
use crate::pipeline::{concat, read_records, source_map, write_records};
use crate::registry::descriptor::TaskExit;

const BUNDLE_NAME: &str = "bundle.css";

pub async fn run(ctx: Arc<EngineContext>) -> Result<TaskExit> {
    let cfg = &*ctx.config;
    let root = Path::new(&cfg.root);
    let fs = ctx.fs.as_ref();

    // The compiler reads its include paths (both library and source sets)
    // from the file-set snapshot in the tool context.
    let tool_ctx = ToolContext {
        config: cfg,
        files: &ctx.files,
    };

    let records = read_records(fs, root, &ctx.files.styles.src)?;
    let compiled = ctx.tools.css_compile.apply(records, &tool_ctx)?;
    let prefixed = ctx.tools.css_prefix.apply(compiled, &tool_ctx)?;

    let sources: Vec<String> = prefixed
        .iter()
        .map(|r| r.path.to_string_lossy().replace('\\', "/"))
        .collect();

    let bundle = concat(&prefixed, BUNDLE_NAME);
    let bundle = ctx.tools.css_minify.apply(vec![bundle], &tool_ctx)?;
    let map = source_map(BUNDLE_NAME, &sources)?;

    let dest = root.join(&cfg.client.dest).join(&cfg.client.styles.dest);
    write_records(fs, &dest, &bundle)?;
    write_records(fs, &dest, &[map])?;

    info!(
        sources = sources.len(),
        bundle = BUNDLE_NAME,
        dest = %dest.display(),
        "style bundle written"
    );
    Ok(TaskExit::Completed)
}
