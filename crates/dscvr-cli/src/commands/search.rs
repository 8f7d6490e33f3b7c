use anyhow::{Context, Result};
use dscvr_core::{FileIndexer, SearchFileByContentsQuery};

use crate::output;
use crate::OutputFormat;

pub async fn run(
    client: &impl FileIndexer,
    query: &str,
    limit: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let mut response = client
        .search_file_by_contents(SearchFileByContentsQuery::new(query))
        .await
        .context("Search failed")?;

    // Backend order is relevance order, so truncation keeps the best hits
    if let Some(limit) = limit {
        response.path.truncate(limit);
    }

    print!("{}", output::format_search(&response, format));

    Ok(())
}
