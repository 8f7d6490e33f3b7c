use std::time::Duration;

use async_trait::async_trait;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::Code;

use dscvr_core::config::IndexerConfig;
use dscvr_core::error::{DscvrError, Result};
use dscvr_core::service::Transport;

use super::{code_name, BytesCodec};

/// Client side of the gRPC binding: one channel per call
#[derive(Debug, Clone)]
pub struct GrpcTransport {
    address: String,
    max_message_size: usize,
    connect_timeout: Duration,
    request_timeout: Option<Duration>,
}

impl GrpcTransport {
    pub fn new(address: impl Into<String>) -> Self {
        Self::from_config(&IndexerConfig::default()).with_address(address)
    }

    pub fn from_config(config: &IndexerConfig) -> Self {
        Self {
            address: config.address(),
            max_message_size: config.max_message_size,
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            request_timeout: (config.request_timeout_ms > 0)
                .then(|| Duration::from_millis(config.request_timeout_ms)),
        }
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Deadline for the whole call, `None` to wait indefinitely
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Check that an HTTP/2 endpoint is accepting connections at the address
    pub async fn check_reachable(&self) -> Result<()> {
        self.connect().await.map(|_| ())
    }

    async fn connect(&self) -> Result<Channel> {
        let endpoint = Endpoint::from_shared(format!("http://{}", self.address))
            .map_err(|e| DscvrError::Config(format!("invalid address {}: {}", self.address, e)))?;

        tokio::time::timeout(self.connect_timeout, endpoint.connect())
            .await
            .map_err(|_| DscvrError::Timeout)?
            .map_err(DscvrError::transport)
    }

    async fn unary(&self, path: PathAndQuery, payload: Vec<u8>) -> Result<Vec<u8>> {
        let channel = self.connect().await?;
        let mut grpc = tonic::client::Grpc::new(channel)
            .max_decoding_message_size(self.max_message_size)
            .max_encoding_message_size(self.max_message_size);

        grpc.ready().await.map_err(DscvrError::transport)?;
        let response = grpc
            .unary(tonic::Request::new(payload), path, BytesCodec)
            .await
            .map_err(error_from_status)?;

        Ok(response.into_inner())
    }
}

#[async_trait]
impl Transport for GrpcTransport {
    async fn invoke(&self, service: &str, method: &str, payload: Vec<u8>) -> Result<Vec<u8>> {
        let path = PathAndQuery::try_from(format!("/{service}/{method}"))
            .map_err(|e| DscvrError::InvalidRequest(format!("{service}/{method}: {e}")))?;

        match self.request_timeout {
            Some(deadline) => tokio::time::timeout(deadline, self.unary(path, payload))
                .await
                .map_err(|_| DscvrError::Timeout)?,
            None => self.unary(path, payload).await,
        }
    }
}

/// Map a gRPC status onto the error taxonomy
fn error_from_status(status: tonic::Status) -> DscvrError {
    match status.code() {
        Code::Unavailable => DscvrError::transport(status),
        Code::DeadlineExceeded => DscvrError::Timeout,
        code => DscvrError::Remote {
            code: code_name(code).to_string(),
            message: status.message().to_string(),
        },
    }
}
