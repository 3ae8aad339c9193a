//! Keys command implementation

use anyhow::Result;
use basis_config::LoadOptions;
use std::path::Path;

/// Print one `key<TAB>kind` line per leaf value.
pub fn execute(file: &Path) -> Result<()> {
    let doc = super::load(file, &LoadOptions::default())?;
    for leaf in doc.flatten() {
        println!("{}\t{}", leaf.key, leaf.kind());
    }
    Ok(())
}
