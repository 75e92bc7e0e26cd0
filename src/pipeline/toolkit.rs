// src/pipeline/toolkit.rs

//! Named transform tools consumed by the pipeline composer.
//!
//! The defaults are deliberately small: deterministic, safe transforms
//! that keep the engine usable without external tooling. Hosts plug real
//! minifiers/compilers in by replacing individual entries.

use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::errors::{DevrigError, Result};
use crate::pipeline::record::{FileRecord, Tool, ToolContext};

/// The full set of transforms the pipelines compose.
#[derive(Clone)]
pub struct ToolKit {
    pub html_minify: Arc<dyn Tool>,
    pub js_transpile: Arc<dyn Tool>,
    pub js_minify: Arc<dyn Tool>,
    pub css_compile: Arc<dyn Tool>,
    pub css_prefix: Arc<dyn Tool>,
    pub css_minify: Arc<dyn Tool>,
    pub image_optimize: Arc<dyn Tool>,
    pub lint: Arc<dyn Tool>,
    pub coverage: Arc<dyn Tool>,
    pub docs: Arc<dyn Tool>,
    pub changelog: Arc<dyn Tool>,
}

impl Default for ToolKit {
    fn default() -> Self {
        Self {
            html_minify: Arc::new(CollapseWhitespace),
            js_transpile: Arc::new(Passthrough::new("js-transpile")),
            js_minify: Arc::new(LightMinify::new("js-minify")),
            css_compile: Arc::new(Passthrough::new("css-compile")),
            css_prefix: Arc::new(Passthrough::new("css-prefix")),
            css_minify: Arc::new(LightMinify::new("css-minify")),
            image_optimize: Arc::new(Passthrough::new("image-optimize")),
            lint: Arc::new(NoFindings),
            coverage: Arc::new(Passthrough::new("coverage")),
            docs: Arc::new(DocBlocks),
            changelog: Arc::new(ChangelogSeed),
        }
    }
}

impl fmt::Debug for ToolKit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolKit")
            .field("html_minify", &self.html_minify.name())
            .field("js_transpile", &self.js_transpile.name())
            .field("js_minify", &self.js_minify.name())
            .field("css_compile", &self.css_compile.name())
            .field("lint", &self.lint.name())
            .finish_non_exhaustive()
    }
}

/// Identity transform.
pub struct Passthrough {
    name: &'static str,
}

impl Passthrough {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl Tool for Passthrough {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, input: Vec<FileRecord>, _ctx: &ToolContext<'_>) -> Result<Vec<FileRecord>> {
        Ok(input)
    }
}

/// Collapses insignificant whitespace in markup: runs of whitespace become
/// a single space, and whitespace between adjacent tags is dropped.
pub struct CollapseWhitespace;

impl Tool for CollapseWhitespace {
    fn name(&self) -> &str {
        "html-minify"
    }

    fn apply(&self, input: Vec<FileRecord>, _ctx: &ToolContext<'_>) -> Result<Vec<FileRecord>> {
        Ok(input
            .into_iter()
            .map(|record| {
                let collapsed = collapse_whitespace(&record.text());
                FileRecord::new(record.path, collapsed)
            })
            .collect())
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for ch in text.chars() {
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                // Whitespace between tags carries no meaning.
                if !(out.ends_with('>') && ch == '<') {
                    out.push(' ');
                }
                pending_space = false;
            }
            out.push(ch);
        }
    }

    out
}

/// Drops blank lines and trailing spaces. Safe for both scripts and
/// stylesheets; real minifiers replace this per instance.
pub struct LightMinify {
    name: &'static str,
}

impl LightMinify {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl Tool for LightMinify {
    fn name(&self) -> &str {
        self.name
    }

    fn apply(&self, input: Vec<FileRecord>, _ctx: &ToolContext<'_>) -> Result<Vec<FileRecord>> {
        Ok(input
            .into_iter()
            .map(|record| {
                let text = record.text().into_owned();
                let minified = text
                    .lines()
                    .map(str::trim_end)
                    .filter(|line| !line.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n");
                FileRecord::new(record.path, minified)
            })
            .collect())
    }
}

/// Lint tool that reports nothing; hosts supply a real analyzer.
pub struct NoFindings;

impl Tool for NoFindings {
    fn name(&self) -> &str {
        "lint"
    }

    fn apply(&self, _input: Vec<FileRecord>, _ctx: &ToolContext<'_>) -> Result<Vec<FileRecord>> {
        Ok(Vec::new())
    }
}

/// Extracts `/** ... */` documentation blocks from script sources.
pub struct DocBlocks;

impl Tool for DocBlocks {
    fn name(&self) -> &str {
        "docs"
    }

    fn apply(&self, input: Vec<FileRecord>, _ctx: &ToolContext<'_>) -> Result<Vec<FileRecord>> {
        let block = Regex::new(r"(?s)/\*\*.*?\*/").map_err(|e| DevrigError::ToolError {
            tool: "docs".to_string(),
            message: format!("building doc-block pattern: {e}"),
        })?;

        let mut out = Vec::new();
        for record in input {
            let text = record.text().into_owned();
            let blocks: Vec<&str> = block.find_iter(&text).map(|m| m.as_str()).collect();
            if blocks.is_empty() {
                continue;
            }
            let mut section = format!("## {}\n\n", record.path.display());
            section.push_str(&blocks.join("\n\n"));
            section.push('\n');
            out.push(FileRecord::new(record.path, section));
        }
        Ok(out)
    }
}

/// Emits a fixed changelog header; real generators derive entries from
/// commit history and replace this tool.
pub struct ChangelogSeed;

impl Tool for ChangelogSeed {
    fn name(&self) -> &str {
        "changelog"
    }

    fn apply(&self, _input: Vec<FileRecord>, _ctx: &ToolContext<'_>) -> Result<Vec<FileRecord>> {
        Ok(vec![FileRecord::new("CHANGELOG.md", "# Changelog\n")])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::Configuration;
    use crate::config::paths::FileSets;

    fn ctx_parts() -> (Configuration, FileSets) {
        let cfg = Configuration::default();
        let files = FileSets::from_config(&cfg);
        (cfg, files)
    }

    #[test]
    fn collapse_whitespace_drops_space_between_tags() {
        assert_eq!(
            collapse_whitespace("<ul>\n  <li>one</li>\n  <li>two</li>\n</ul>"),
            "<ul><li>one</li><li>two</li></ul>"
        );
        assert_eq!(collapse_whitespace("a   b"), "a b");
    }

    #[test]
    fn light_minify_drops_blank_lines() {
        let (cfg, files) = ctx_parts();
        let ctx = ToolContext {
            config: &cfg,
            files: &files,
        };
        let tool = LightMinify::new("js-minify");
        let out = tool
            .apply(vec![FileRecord::new("a.js", "var a = 1;  \n\n\nvar b = 2;\n")], &ctx)
            .unwrap();
        assert_eq!(out[0].text(), "var a = 1;\nvar b = 2;");
    }

    #[test]
    fn doc_blocks_extracts_comment_blocks() {
        let (cfg, files) = ctx_parts();
        let ctx = ToolContext {
            config: &cfg,
            files: &files,
        };
        let source = "/** Adds. */\nfunction add() {}\n/** Subtracts. */\nfunction sub() {}\n";
        let out = DocBlocks
            .apply(vec![FileRecord::new("math.js", source)], &ctx)
            .unwrap();
        assert_eq!(out.len(), 1);
        let text = out[0].text().into_owned();
        assert!(text.contains("/** Adds. */"));
        assert!(text.contains("/** Subtracts. */"));
        assert!(!text.contains("function"));
    }

    #[test]
    fn files_without_doc_blocks_are_skipped() {
        let (cfg, files) = ctx_parts();
        let ctx = ToolContext {
            config: &cfg,
            files: &files,
        };
        let out = DocBlocks
            .apply(vec![FileRecord::new("plain.js", "var x = 1;")], &ctx)
            .unwrap();
        assert!(out.is_empty());
    }
}
