use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use dscvr_core::config::TransportKind;
use dscvr_core::{Config, FileIndexerClient, MessageKind, Transport};
use dscvr_daemon::{GrpcTransport, TcpTransport};

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "dscvr")]
#[command(about = "Search and deduplicate files through the dscvr indexer", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Search query (shorthand for `dscvr search <QUERY>`)
    #[arg(trailing_var_arg = true, num_args = 0..)]
    pub query: Vec<String>,

    /// Config file (default: .dscvr.toml or ~/.config/dscvr/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Indexer host (overrides config)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Indexer port (overrides config)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Wire to use: grpc (indexer) or tcp (dscvr daemon)
    #[arg(long, global = true)]
    pub transport: Option<TransportKind>,

    /// Output format: ai, json, pretty
    #[arg(short, long, default_value = "ai", global = true)]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search indexed files by contents (default command)
    Search {
        /// Search query
        query: String,

        /// Maximum results to print
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// List groups of files with identical contents
    Duplicates {
        /// Only consider files under this path
        #[arg(long = "from")]
        starting_at: Option<String>,
    },

    /// Send scanned files to the indexer (JSON, `-` for stdin)
    Index {
        /// JSON array of scanned files, or an IndexFileQuery object
        input: PathBuf,
    },

    /// Decode a raw message buffer and print it as JSON
    Inspect {
        /// Message type, e.g. DuplicatedFile or file_indexer.SearchFileResponse
        #[arg(short, long)]
        kind: MessageKind,

        /// File holding the encoded bytes (`-` for stdin)
        input: PathBuf,
    },

    /// Show configuration and backend reachability
    Status,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// AI-optimized minimal output (default)
    Ai,
    /// JSON output
    Json,
    /// Human-readable formatted output
    Pretty,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose || std::env::var("DSCVR_DEBUG").is_ok() {
        "debug"
    } else {
        "warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Resolve configuration: file, then transport choice, then env, then flags
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load(),
    };
    if let Some(transport) = cli.transport {
        config.client.transport = transport;
    }
    config.apply_env();
    config.set_endpoint(cli.host.clone(), cli.port);

    let transport: Arc<dyn Transport> = match config.client.transport {
        TransportKind::Grpc => Arc::new(GrpcTransport::from_config(&config.indexer)),
        TransportKind::Tcp => Arc::new(TcpTransport::from_config(&config.daemon)),
    };
    let client =
        FileIndexerClient::with_service_name(transport, config.client.service_name.clone());

    // Handle command
    match cli.command {
        Some(Commands::Search { query, limit }) => {
            commands::search::run(&client, &query, limit, cli.format).await?;
        }
        Some(Commands::Duplicates { starting_at }) => {
            commands::duplicates::run(&client, starting_at, cli.format, &config.output).await?;
        }
        Some(Commands::Index { input }) => {
            commands::index::run(&client, &input).await?;
        }
        Some(Commands::Inspect { kind, input }) => {
            commands::inspect::run(kind, &input)?;
        }
        Some(Commands::Status) => {
            commands::status::run(&config).await?;
        }
        None => {
            // Default: treat trailing args as search query
            if cli.query.is_empty() {
                // No query, show help
                use clap::CommandFactory;
                Cli::command().print_help()?;
                println!();
            } else {
                let query = cli.query.join(" ");
                commands::search::run(&client, &query, None, cli.format).await?;
            }
        }
    }

    Ok(())
}
