//! Text command implementation

use anyhow::Result;
use basis_config::LoadOptions;
use std::path::Path;

pub fn execute(file: &Path) -> Result<()> {
    let doc = super::load(file, &LoadOptions::default())?;
    println!("{}", doc.text());
    Ok(())
}
