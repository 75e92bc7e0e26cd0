// src/pipeline/scripts.rs

//! Script pipeline.
//!
//! Three independently-produced streams (concatenated library scripts,
//! view templates compiled into a script-loadable cache, and transpiled
//! client sources) merge in that order into a single bundle, which is
//! minified and written together with its source map.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::paths::join_dir;
use crate::engine::EngineContext;
use crate::errors::Result;
use crate::pipeline::record::{FileRecord, ToolContext};
use crate::pipeline::{concat, read_records, rebase, source_map, write_records};
use crate::registry::descriptor::TaskExit;

const BUNDLE_NAME: &str = "bundle.js";
const TEMPLATE_CACHE_NAME: &str = "templates";

pub async fn run(ctx: Arc<EngineContext>) -> Result<TaskExit> {
    let cfg = &*ctx.config;
    let root = Path::new(&cfg.root);
    let fs = ctx.fs.as_ref();
    let tool_ctx = ToolContext {
        config: cfg,
        files: &ctx.files,
    };

    // Stream 1: library scripts, concatenated as-is.
    let lib = read_records(fs, root, &ctx.files.scripts.lib)?;

    // Stream 2: view templates, minified and compiled into a cache keyed by
    // template path.
    let templates = read_records(fs, root, &ctx.files.templates.src)?;
    let templates = ctx.tools.html_minify.apply(templates, &tool_ctx)?;
    let template_base = join_dir(&[&cfg.client.cwd, &cfg.client.templates.cwd]);
    let cache = template_cache(&rebase(templates, &template_base))?;

    // Stream 3: transpiled client sources.
    let src = read_records(fs, root, &ctx.files.scripts.src)?;
    let src = ctx.tools.js_transpile.apply(src, &tool_ctx)?;

    // Ordered merge: libraries, then templates, then sources.
    let mut merged: Vec<FileRecord> = lib;
    merged.extend(cache);
    merged.extend(src);

    let sources: Vec<String> = merged
        .iter()
        .map(|r| r.path.to_string_lossy().replace('\\', "/"))
        .collect();

    let bundle = concat(&merged, BUNDLE_NAME);
    let bundle = ctx.tools.js_minify.apply(vec![bundle], &tool_ctx)?;
    let map = source_map(BUNDLE_NAME, &sources)?;

    let dest = root.join(&cfg.client.dest).join(&cfg.client.scripts.dest);
    write_records(fs, &dest, &bundle)?;
    write_records(fs, &dest, &[map])?;

    info!(
        sources = sources.len(),
        bundle = BUNDLE_NAME,
        dest = %dest.display(),
        "script bundle written"
    );
    Ok(TaskExit::Completed)
}

/// Compile minified templates into one script-loadable cache record, keyed
/// by template path. Returns no record when there are no templates, so an
/// empty project contributes nothing to the bundle.
fn template_cache(templates: &[FileRecord]) -> Result<Option<FileRecord>> {
    if templates.is_empty() {
        return Ok(None);
    }

    let mut out = String::from("(function (templates) {\n");
    for template in templates {
        let key = template.path.to_string_lossy().replace('\\', "/");
        out.push_str(&format!(
            "  templates[{}] = {};\n",
            serde_json::to_string(&key)?,
            serde_json::to_string(template.text().as_ref())?
        ));
    }
    out.push_str("}(window.templates = window.templates || {}));\n");

    Ok(Some(FileRecord::new(
        format!("{TEMPLATE_CACHE_NAME}.js"),
        out,
    )))
}
