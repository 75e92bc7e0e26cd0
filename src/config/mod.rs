// src/config/mod.rs

//! Configuration resolution and file-set derivation.
//!
//! - [`model`] holds the typed configuration tree and its defaults.
//! - [`merge`] deep-merges caller-supplied options over the defaults.
//! - [`loader`] reads a TOML file and resolves it.
//! - [`paths`] derives the concrete per-category file-pattern sets.

pub mod loader;
pub mod merge;
pub mod model;
pub mod paths;

pub use loader::{default_config_path, load_from_path};
pub use merge::{resolve, resolve_str};
pub use model::Configuration;
pub use paths::{CategoryFiles, FileSets, StyleIncludes};
