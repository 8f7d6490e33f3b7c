use anyhow::{Context, Result};
use dscvr_core::config::OutputConfig;
use dscvr_core::{FileIndexer, FindDuplicatedFilesQuery};

use crate::output;
use crate::OutputFormat;

pub async fn run(
    client: &impl FileIndexer,
    starting_at: Option<String>,
    format: OutputFormat,
    options: &OutputConfig,
) -> Result<()> {
    let query = FindDuplicatedFilesQuery {
        starting_at_path: starting_at,
    };

    let response = client
        .find_duplicated_files(query)
        .await
        .context("Failed to find duplicated files")?;

    tracing::info!("Retrieved {} duplicate groups", response.files.len());

    print!("{}", output::format_duplicates(&response, format, options));

    Ok(())
}
