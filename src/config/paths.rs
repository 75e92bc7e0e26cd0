// src/config/paths.rs

//! Derivation of concrete file-pattern sets from the resolved configuration.
//!
//! Pure function of the configuration; computed once per engine instance
//! and treated as a constant snapshot afterwards.

use crate::config::model::Configuration;

/// Source and library pattern lists for one asset category.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryFiles {
    pub src: Vec<String>,
    pub lib: Vec<String>,
}

/// Include-path pattern lists for the style compiler, resolved separately
/// under the client source root and the library root.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleIncludes {
    pub src: Vec<String>,
    pub lib: Vec<String>,
}

/// Snapshot of every category's resolved patterns.
#[derive(Debug, Clone, PartialEq)]
pub struct FileSets {
    pub html: CategoryFiles,
    pub scripts: CategoryFiles,
    pub styles: CategoryFiles,
    pub style_includes: StyleIncludes,
    pub templates: CategoryFiles,
    pub images: CategoryFiles,
}

impl FileSets {
    /// Derive all category file sets from the configuration.
    ///
    /// The prefix for every category is `[client.cwd, category.cwd]` with
    /// falsy segments omitted; the library script set uses `[client.lib]`
    /// instead.
    pub fn from_config(cfg: &Configuration) -> Self {
        let client = &cfg.client;

        Self {
            html: CategoryFiles {
                src: join_patterns(&[&client.cwd], &client.html.src),
                lib: Vec::new(),
            },
            scripts: CategoryFiles {
                src: join_patterns(&[&client.cwd, &client.scripts.cwd], &client.scripts.src),
                lib: join_patterns(&[&client.lib], &client.scripts.lib),
            },
            styles: CategoryFiles {
                src: join_patterns(&[&client.cwd, &client.styles.cwd], &client.styles.src),
                lib: Vec::new(),
            },
            style_includes: StyleIncludes {
                src: join_patterns(&[&client.cwd], &client.styles.include.src),
                lib: join_patterns(&[&client.lib], &client.styles.include.lib),
            },
            templates: CategoryFiles {
                src: join_patterns(&[&client.cwd, &client.templates.cwd], &client.templates.src),
                lib: Vec::new(),
            },
            images: CategoryFiles {
                src: join_patterns(&[&client.cwd, &client.images.cwd], &client.images.src),
                lib: Vec::new(),
            },
        }
    }
}

/// Join each pattern onto the given prefix segments, skipping empty ones.
///
/// Joins use forward slashes so glob syntax survives on every platform.
/// Root segments come first, which keeps the resulting lists order-stable
/// for downstream glob matching.
pub fn join_patterns(prefix: &[&str], patterns: &[String]) -> Vec<String> {
    patterns
        .iter()
        .map(|pattern| {
            let mut parts: Vec<&str> = prefix.iter().copied().filter(|s| !s.is_empty()).collect();
            parts.push(pattern.as_str());
            parts.join("/")
        })
        .collect()
}

/// Join directory segments with forward slashes, skipping empty ones.
pub fn join_dir(segments: &[&str]) -> String {
    segments
        .iter()
        .copied()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}
