// src/pipeline/mod.rs

//! Pipeline stage composition for each asset category.
//!
//! Every category body is an ordered sequence of steps over one or more
//! input streams (read → transform → aggregate → write) producing one
//! artifact tree under the client destination directory. The transforms
//! themselves are opaque [`Tool`]s; this module owns ordering and
//! input/output paths only.

pub mod docs;
pub mod images;
pub mod lint;
pub mod markup;
pub mod record;
pub mod scripts;
pub mod styles;
pub mod testing;
pub mod toolkit;

use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::fs::FileSystem;

pub use record::{FileRecord, Tool, ToolContext};
pub use toolkit::ToolKit;

/// Read every file matching `patterns` (relative to the engine root) into
/// records keyed by their root-relative path.
///
/// Records are sorted by path, so repeated reads of unchanged inputs yield
/// identical ordered streams.
pub(crate) fn read_records(
    fs: &dyn FileSystem,
    root: &Path,
    patterns: &[String],
) -> Result<Vec<FileRecord>> {
    if patterns.is_empty() {
        return Ok(Vec::new());
    }

    let globs = crate::fs::build_globset(patterns)?;
    let mut paths = crate::fs::collect_files(fs, root, &globs)?;
    paths.sort();

    let mut records = Vec::with_capacity(paths.len());
    for rel in paths {
        let contents = fs.read(&root.join(&rel))?;
        records.push(FileRecord::new(rel, contents));
    }
    Ok(records)
}

/// Write records under `dest_dir`, preserving each record's relative path.
pub(crate) fn write_records(
    fs: &dyn FileSystem,
    dest_dir: &Path,
    records: &[FileRecord],
) -> Result<()> {
    for record in records {
        fs.write(&dest_dir.join(&record.path), &record.contents)?;
    }
    Ok(())
}

/// Delete files under `dir` matching this category's raw source patterns,
/// so outputs of removed sources do not linger between builds.
pub(crate) fn clear_stale(fs: &dyn FileSystem, dir: &Path, patterns: &[String]) -> Result<()> {
    if !fs.is_dir(dir) {
        return Ok(());
    }

    let globs = crate::fs::build_globset(patterns)?;
    for rel in crate::fs::collect_files(fs, dir, &globs)? {
        fs.remove_file(&dir.join(rel))?;
    }
    Ok(())
}

/// Strip a source-prefix directory from record paths so artifacts land at
/// the same relative location under the destination tree.
pub(crate) fn rebase(records: Vec<FileRecord>, base: &str) -> Vec<FileRecord> {
    if base.is_empty() {
        return records;
    }

    records
        .into_iter()
        .map(|mut record| {
            if let Ok(stripped) = record.path.strip_prefix(base) {
                record.path = stripped.to_path_buf();
            }
            record
        })
        .collect()
}

/// Concatenate record contents, in stream order, into a single record.
pub(crate) fn concat(records: &[FileRecord], out_name: &str) -> FileRecord {
    let mut contents = Vec::new();
    for (index, record) in records.iter().enumerate() {
        if index > 0 {
            contents.push(b'\n');
        }
        contents.extend_from_slice(&record.contents);
    }
    FileRecord::new(out_name, contents)
}

/// Deterministic source-map skeleton for a concatenated bundle.
///
/// Contains no timestamps, so repeated builds of unchanged inputs are
/// byte-identical.
pub(crate) fn source_map(file: &str, sources: &[String]) -> Result<FileRecord> {
    let map = serde_json::json!({
        "version": 3,
        "file": file,
        "sources": sources,
        "mappings": "",
    });
    let contents = serde_json::to_vec(&map)?;
    Ok(FileRecord::new(PathBuf::from(format!("{file}.map")), contents))
}
