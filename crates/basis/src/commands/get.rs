//! Get command implementation

use anyhow::Result;
use basis_config::{ConfigError, LoadOptions, format_value};
use std::path::Path;

/// Print the value at a dotted key. Strings are printed without quotes.
pub fn execute(file: &Path, key: &str) -> Result<()> {
    let doc = super::load(file, &LoadOptions::default())?;
    let value = doc.get_path(key).ok_or_else(|| ConfigError::MissingKey {
        key: key.to_string(),
    })?;

    match value.as_str() {
        Some(s) => println!("{}", s),
        None => println!("{}", format_value(value)),
    }
    Ok(())
}
