use anyhow::Result;
use dscvr_core::config::TransportKind;
use dscvr_core::Config;
use dscvr_daemon::{GrpcTransport, TcpTransport};

pub async fn run(config: &Config) -> Result<()> {
    println!("dscvr status");
    println!("============");
    println!();
    println!("Transport: {}", config.client.transport);
    println!("Endpoint: {}", config.endpoint());
    println!("Service: {}", config.client.service_name);

    let (max_size, request_timeout_ms) = match config.client.transport {
        TransportKind::Grpc => (config.indexer.max_message_size, config.indexer.request_timeout_ms),
        TransportKind::Tcp => (config.daemon.max_frame_size, config.daemon.request_timeout_ms),
    };
    println!("Max message size: {} bytes", max_size);
    match request_timeout_ms {
        0 => println!("Request timeout: none"),
        ms => println!("Request timeout: {}ms", ms),
    }
    if let Some(path) = Config::user_config_path() {
        println!("User config: {}", path.display());
    }

    let reachability = match config.client.transport {
        TransportKind::Grpc => GrpcTransport::from_config(&config.indexer).check_reachable().await,
        TransportKind::Tcp => TcpTransport::from_config(&config.daemon).check_reachable().await,
    };
    let reachable = match reachability {
        Ok(()) => "yes".to_string(),
        Err(e) => format!("no ({})", e),
    };
    println!("Reachable: {}", reachable);

    Ok(())
}
