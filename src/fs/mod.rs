// src/fs/mod.rs

//! Filesystem abstraction and file-matching helpers.
//!
//! The pipeline composer reads, writes and deletes through [`FileSystem`]
//! so tests can run against an in-memory tree.

use std::fmt::Debug;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};

pub mod mock;

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn read(&self, path: &Path) -> Result<Vec<u8>>;
    fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    fn remove_file(&self, path: &Path) -> Result<()>;
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// Return a list of entries in a directory.
    /// Returns full paths.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading file {:?}", path))
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).with_context(|| format!("reading file {:?}", path))
    }

    fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating dir {:?}", parent))?;
        }
        let mut file = fs::File::create(path).with_context(|| format!("creating file {:?}", path))?;
        file.write_all(contents).with_context(|| format!("writing to file {:?}", path))?;
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).with_context(|| format!("removing file {:?}", path))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).with_context(|| format!("reading dir {:?}", path))? {
            let entry = entry?;
            entries.push(entry.path());
        }
        Ok(entries)
    }
}

/// Build a `GlobSet` from simple string patterns.
///
/// Literal paths are valid globs, so manifest files can be matched with the
/// same mechanism as wildcard patterns.
pub fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).with_context(|| format!("invalid glob pattern: {pattern}"))?;
        builder.add(glob);
    }
    builder.build().context("building glob set")
}

/// Collect all files under `root` matching the given glob set.
///
/// Returned paths are relative to `root`, with forward slashes assumed in
/// the patterns.
pub fn collect_files(fs: &dyn FileSystem, root: &Path, globs: &GlobSet) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            if fs.is_dir(&path) {
                stack.push(path);
            } else if fs.is_file(&path) {
                // A "." root and an already-relative entry are the same tree;
                // strip_prefix alone would reject that combination.
                let rel = match path.strip_prefix(root) {
                    Ok(rel) => rel,
                    Err(_) if root == Path::new(".") && path.is_relative() => path.as_path(),
                    Err(_) => continue,
                };
                let rel_str = rel.to_string_lossy().replace('\\', "/");
                if globs.is_match(&rel_str) {
                    files.push(rel.to_path_buf());
                }
            }
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn collect_files_returns_relative_matches() {
        let fs = MockFileSystem::new();
        fs.add_file("client/src/a.js", "a");
        fs.add_file("client/src/nested/b.js", "b");
        fs.add_file("client/src/readme.md", "nope");

        let globs = build_globset(&["client/src/**/*.js".to_string()]).unwrap();
        let mut files = collect_files(&fs, Path::new("."), &globs).unwrap();
        files.sort();

        assert_eq!(
            files,
            vec![
                PathBuf::from("client/src/a.js"),
                PathBuf::from("client/src/nested/b.js")
            ]
        );
    }

    #[test]
    fn literal_patterns_match_exact_paths() {
        let fs = MockFileSystem::new();
        fs.add_file("package.json", "{}");
        fs.add_file("package-lock.json", "{}");

        let globs = build_globset(&["package.json".to_string()]).unwrap();
        let files = collect_files(&fs, Path::new("."), &globs).unwrap();

        assert_eq!(files, vec![PathBuf::from("package.json")]);
    }
}
