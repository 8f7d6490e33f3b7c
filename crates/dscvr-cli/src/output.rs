use dscvr_core::config::OutputConfig;
use dscvr_core::{DuplicatedFile, FindDuplicatedFilesResponse, JsonProjection, SearchFileResponse};

use crate::OutputFormat;

/// Render search hits, keeping backend order
pub fn format_search(response: &SearchFileResponse, format: OutputFormat) -> String {
    let mut output = String::new();

    match format {
        OutputFormat::Json => {
            output.push_str(&response.to_json_pretty());
            output.push('\n');
        }
        OutputFormat::Ai => {
            output.push_str(&format!("# {} results\n\n", response.path.len()));
            for (i, path) in response.path.iter().enumerate() {
                output.push_str(&format!("{}. `{}`\n", i + 1, path));
            }
        }
        OutputFormat::Pretty => {
            output.push_str(&format!("Found {} files\n", response.path.len()));
            output.push_str(&"─".repeat(50));
            output.push('\n');
            for path in &response.path {
                output.push_str(&format!("  {}\n", path));
            }
        }
    }

    output
}

/// Render duplicate groups
pub fn format_duplicates(
    response: &FindDuplicatedFilesResponse,
    format: OutputFormat,
    options: &OutputConfig,
) -> String {
    let mut output = String::new();

    match format {
        OutputFormat::Json => {
            output.push_str(&response.to_json_pretty());
            output.push('\n');
        }
        OutputFormat::Ai => {
            output.push_str(&format!("# {} duplicate groups\n\n", response.files.len()));
            for (i, group) in response.files.iter().enumerate() {
                output.push_str(&format!(
                    "{}. {} ({} copies",
                    i + 1,
                    short_hash(&group.hash),
                    group.duplicates
                ));
                if options.show_sizes {
                    output.push_str(&format!(", {}", format_size(group.aggregated_size)));
                }
                output.push_str(")\n");
                for path in visible_paths(group, options) {
                    output.push_str(&format!("   `{}`\n", path));
                }
                push_hidden_count(&mut output, group, options, "   ");
            }
        }
        OutputFormat::Pretty => {
            output.push_str(&format!(
                "Found {} groups of duplicated files\n",
                response.files.len()
            ));
            output.push_str(&"─".repeat(50));
            output.push('\n');
            for group in &response.files {
                output.push_str(&format!("\n{}", file_name(group)));
                if options.show_sizes {
                    output.push_str(&format!(" ({})", format_size(group.aggregated_size)));
                }
                output.push_str(&format!(
                    "\n  in {} locations, hash {}\n",
                    group.paths.len(),
                    group.hash
                ));
                for path in visible_paths(group, options) {
                    output.push_str(&format!("  │ {}\n", path));
                }
                push_hidden_count(&mut output, group, options, "  │ ");
            }
        }
    }

    output
}

fn visible_paths<'a>(
    group: &'a DuplicatedFile,
    options: &OutputConfig,
) -> impl Iterator<Item = &'a String> {
    let limit = match options.max_paths_per_group {
        0 => usize::MAX,
        n => n,
    };
    group.paths.iter().take(limit)
}

fn push_hidden_count(
    output: &mut String,
    group: &DuplicatedFile,
    options: &OutputConfig,
    indent: &str,
) {
    let shown = options.max_paths_per_group;
    if shown > 0 && group.paths.len() > shown {
        output.push_str(&format!("{}... and {} more\n", indent, group.paths.len() - shown));
    }
}

/// Last path component of the first location, either separator style
fn file_name(group: &DuplicatedFile) -> &str {
    group
        .paths
        .first()
        .and_then(|path| path.rsplit(['/', '\\']).next())
        .filter(|name| !name.is_empty())
        .unwrap_or("(unnamed)")
}

fn short_hash(hash: &str) -> &str {
    match hash.char_indices().nth(12) {
        Some((end, _)) => &hash[..end],
        None => hash,
    }
}

/// Format bytes as human readable
fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;

    if bytes >= GIB {
        format!("{:.2} GiB", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.2} MiB", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FindDuplicatedFilesResponse {
        FindDuplicatedFilesResponse {
            files: vec![DuplicatedFile {
                paths: vec![
                    "C:\\Users\\me\\report.pdf".to_string(),
                    "/mnt/backup/report.pdf".to_string(),
                    "/tmp/report.pdf".to_string(),
                ],
                aggregated_size: 3 * 1_048_576,
                duplicates: 3,
                hash: "0123456789abcdef0123".to_string(),
            }],
        }
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KiB");
        assert_eq!(format_size(2_097_152), "2.00 MiB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GiB");
    }

    #[test]
    fn test_format_search_ai_keeps_order() {
        let response = SearchFileResponse {
            path: vec!["/z".to_string(), "/a".to_string()],
        };
        let output = format_search(&response, OutputFormat::Ai);
        assert!(output.starts_with("# 2 results"));
        assert!(output.find("1. `/z`").unwrap() < output.find("2. `/a`").unwrap());
    }

    #[test]
    fn test_format_search_json_is_projection() {
        let output = format_search(&SearchFileResponse::default(), OutputFormat::Json);
        assert_eq!(output.trim(), "{}");
    }

    #[test]
    fn test_format_duplicates_ai() {
        let output = format_duplicates(&sample(), OutputFormat::Ai, &OutputConfig::default());
        assert!(output.contains("# 1 duplicate groups"));
        assert!(output.contains("1. 0123456789ab (3 copies, 3.00 MiB)"));
        assert!(output.contains("`/tmp/report.pdf`"));
    }

    #[test]
    fn test_format_duplicates_pretty_limits_paths() {
        let options = OutputConfig {
            show_sizes: false,
            max_paths_per_group: 1,
        };
        let output = format_duplicates(&sample(), OutputFormat::Pretty, &options);
        assert!(output.contains("\nreport.pdf\n"));
        assert!(output.contains("in 3 locations"));
        assert!(output.contains("... and 2 more"));
        assert!(!output.contains("/tmp/report.pdf"));
        assert!(!output.contains("MiB"));
    }

    #[test]
    fn test_format_duplicates_json_renders_integers() {
        let mut response = sample();
        response.files[0].aggregated_size = 9_007_199_254_740_993;
        let output = format_duplicates(&response, OutputFormat::Json, &OutputConfig::default());
        assert!(output.contains("\"aggregatedSize\": 9007199254740993"));
    }
}
