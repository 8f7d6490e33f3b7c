use anyhow::{Context, Result};
use std::path::Path;

use dscvr_core::MessageKind;

use super::read_input;

pub fn run(kind: MessageKind, input: &Path) -> Result<()> {
    let bytes = read_input(input)?;

    let json = kind
        .decode_to_json(&bytes)
        .with_context(|| format!("Failed to decode {} bytes as {}", bytes.len(), kind))?;

    println!("{}", serde_json::to_string_pretty(&json)?);

    Ok(())
}
