// src/sched/watcher.rs

//! `notify`-backed implementation of the scheduler's watch primitive.

use std::path::{Path, PathBuf};

use notify::{Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info};

use crate::errors::Result;
use crate::sched::{WatchCallback, WatchGuard};

/// Spawn a filesystem watcher that observes `root` recursively and invokes
/// `on_change` for every changed path matching `patterns`.
///
/// Patterns are evaluated against paths relative to `root`, with forward
/// slashes. The returned guard keeps the underlying watcher alive; dropping
/// it stops the binding.
pub fn spawn_watch(
    root: PathBuf,
    patterns: Vec<String>,
    on_change: WatchCallback,
) -> Result<WatchGuard> {
    // Canonicalize once so we have a stable base path.
    let root = root.canonicalize().unwrap_or(root);
    let globs = crate::fs::build_globset(&patterns)?;

    // Channel from the blocking notify callback into the async world.
    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if event_tx.send(event).is_err() {
                    // We can't log via tracing here easily, so fall back to stderr.
                    eprintln!("devrig: failed to forward notify event");
                }
            }
            Err(err) => {
                eprintln!("devrig: file watch error: {err}");
            }
        },
        NotifyConfig::default(),
    )
    .map_err(|e| anyhow::anyhow!("creating file watcher: {e}"))?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| anyhow::anyhow!("watching {:?}: {e}", root))?;

    info!(?root, ?patterns, "watch binding started");

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            for path in event.paths {
                let Some(rel) = relative_str(&root, &path) else {
                    continue;
                };
                if globs.is_match(&rel) {
                    debug!(path = %rel, "watch match");
                    on_change(Path::new(&rel));
                }
            }
        }
        debug!("watch event loop finished");
    });

    Ok(WatchGuard::new(Box::new(watcher)))
}

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
///
/// Returns `None` if the path cannot be reasonably related to `root`.
fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_string_lossy().replace('\\', "/"));
    }

    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(rel.to_string_lossy().replace('\\', "/"));
        }
    }

    None
}
