//! Command implementations for the basis CLI
//!
//! Each command module handles the CLI interface and delegates to
//! basis-config for loading and merging.

pub mod get;
pub mod keys;
pub mod show;
pub mod text;

use anyhow::{Context, Result};
use basis_config::{ConfigDocument, LoadOptions};
use std::path::Path;

/// Load a config file, attaching the path to any error.
pub fn load(file: &Path, options: &LoadOptions) -> Result<ConfigDocument> {
    let doc = ConfigDocument::from_file(file, options)
        .with_context(|| format!("Failed to load config {}", file.display()))?;
    tracing::debug!(path = %file.display(), keys = doc.len(), "loaded config");
    Ok(doc)
}
