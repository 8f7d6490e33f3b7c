pub mod duplicates;
pub mod index;
pub mod inspect;
pub mod search;
pub mod status;

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

/// Read a whole file, or stdin when the path is `-`
pub fn read_input(path: &Path) -> Result<Vec<u8>> {
    if path.as_os_str() == "-" {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("Failed to read stdin")?;
        Ok(buf)
    } else {
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
    }
}
