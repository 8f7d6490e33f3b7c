use thiserror::Error;

/// Boxed error produced by a transport implementation
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum DscvrError {
    #[error("Malformed varint")]
    MalformedVarint,

    #[error("Truncated message: needed {needed} bytes, {remaining} remaining")]
    TruncatedMessage { needed: usize, remaining: usize },

    #[error("Integer overflow while decoding a 64-bit field")]
    IntegerOverflow,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid UTF-8 in field `{field}`")]
    InvalidUtf8 { field: &'static str },

    #[error("Invalid wire type: {0}")]
    InvalidWireType(u8),

    #[error("Invalid tag: {0}")]
    InvalidTag(String),

    #[error("Unknown method: {service}/{method}")]
    UnknownMethod { service: String, method: String },

    #[error("Remote error ({code}): {message}")]
    Remote { code: String, message: String },

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Transport failure: {0}")]
    TransportFailure(#[source] BoxError),

    #[error("Request timed out")]
    Timeout,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DscvrError {
    /// Wrap an arbitrary transport error without reinterpreting it
    pub fn transport(err: impl Into<BoxError>) -> Self {
        Self::TransportFailure(err.into())
    }

    /// Whether this error was produced while decoding a buffer
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedVarint
                | Self::TruncatedMessage { .. }
                | Self::IntegerOverflow
                | Self::InvalidUtf8 { .. }
                | Self::InvalidWireType(_)
                | Self::InvalidTag(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DscvrError>;
