use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;
use std::time::Instant;

use dscvr_core::{FileIndexer, IndexFileQuery, JsonProjection};

use super::read_input;

pub async fn run(client: &impl FileIndexer, input: &Path) -> Result<()> {
    let raw = read_input(input)?;
    let query = parse_query(&raw)?;

    let count = query.scanned_files.len();
    if count == 0 {
        eprintln!("Nothing to index.");
        return Ok(());
    }

    let start = Instant::now();
    eprintln!("Sending {} scanned files...", count);

    client
        .index_file(query)
        .await
        .context("Failed to index files")?;

    eprintln!("Indexed {} files in {:.2}s", count, start.elapsed().as_secs_f64());

    Ok(())
}

/// Accept either a bare array of scanned files or a full IndexFileQuery object
fn parse_query(raw: &[u8]) -> Result<IndexFileQuery> {
    let value: Value = serde_json::from_slice(raw).context("Input is not valid JSON")?;

    let value = match value {
        Value::Array(files) => serde_json::json!({ "scannedFiles": files }),
        other => other,
    };

    IndexFileQuery::from_json(value).context("Input is not a valid list of scanned files")
}
