//! Show command implementation

use anyhow::{Context, Result};
use basis_config::{DumpFormat, LoadOptions, parse_overrides};
use std::path::PathBuf;

/// Arguments for the show command
#[derive(Debug)]
pub struct ShowArgs {
    pub file: PathBuf,
    pub format: DumpFormat,
    /// Raw KEY=VALUE overrides
    pub set: Vec<String>,
    pub use_predefined_variables: bool,
}

/// Execute the show command
pub fn execute(args: ShowArgs) -> Result<()> {
    let options = LoadOptions {
        use_predefined_variables: args.use_predefined_variables,
        ..LoadOptions::default()
    };
    let mut doc = super::load(&args.file, &options)?;

    if !args.set.is_empty() {
        let overrides = parse_overrides(args.set.as_slice())?;
        doc = doc
            .merge_from_dict(&overrides)
            .context("Failed to apply overrides")?;
    }

    let rendered = doc
        .dump(args.format)
        .with_context(|| format!("Failed to render config as {}", args.format))?;
    print!("{}", rendered);
    Ok(())
}
