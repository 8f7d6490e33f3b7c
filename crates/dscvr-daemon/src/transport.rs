use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

use dscvr_core::config::DaemonConfig;
use dscvr_core::error::{DscvrError, Result};
use dscvr_core::message::Message;
use dscvr_core::service::Transport;

use crate::protocol::{read_frame, write_frame, Request, Response};

/// Client side of the daemon protocol: one TCP connection per call
#[derive(Debug, Clone)]
pub struct TcpTransport {
    address: String,
    max_frame_size: usize,
    connect_timeout: Duration,
    request_timeout: Option<Duration>,
}

impl TcpTransport {
    pub fn new(address: impl Into<String>) -> Self {
        Self::from_config(&DaemonConfig::default()).with_address(address)
    }

    pub fn from_config(config: &DaemonConfig) -> Self {
        Self {
            address: config.address(),
            max_frame_size: config.max_frame_size,
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

    /// Check that something is accepting connections at the address
    pub async fn check_reachable(&self) -> Result<()> {
        self.connect().await.map(|_| ())
    }

    async fn connect(&self) -> Result<TcpStream> {
        let stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(&self.address))
            .await
            .map_err(|_| DscvrError::Timeout)?
            .map_err(DscvrError::transport)?;
        stream.set_nodelay(true).map_err(DscvrError::transport)?;
        Ok(stream)
    }

    async fn exchange(&self, request: Request) -> Result<Vec<u8>> {
        let mut stream = self.connect().await?;

        write_frame(&mut stream, &request.encode(), self.max_frame_size)
            .await
            .map_err(io_as_transport)?;

        let frame = read_frame(&mut stream, self.max_frame_size)
            .await
            .map_err(io_as_transport)?
            .ok_or_else(|| DscvrError::transport("connection closed before a response arrived"))?;

        Response::decode(&frame)?.into_result()
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn invoke(&self, service: &str, method: &str, payload: Vec<u8>) -> Result<Vec<u8>> {
        let request = Request {
            service: service.to_string(),
            method: method.to_string(),
            payload,
        };

        match self.request_timeout {
            Some(deadline) => tokio::time::timeout(deadline, self.exchange(request))
                .await
                .map_err(|_| DscvrError::Timeout)?,
            None => self.exchange(request).await,
        }
    }
}

/// Socket errors are opaque transport failures to the caller
fn io_as_transport(err: DscvrError) -> DscvrError {
    match err {
        DscvrError::Io(e) => DscvrError::transport(e),
        other => other,
    }
}
