//! Envelope and framing for RPC calls over a byte stream
//!
//! Every frame is a 4-byte big-endian length followed by an envelope encoded
//! with the same codec as the service messages.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use dscvr_core::error::{DscvrError, Result};
use dscvr_core::message::Message;
use dscvr_core::wire::{
    bytes_field_len, message_field_len, put_bytes, put_message, put_string, Reader, WireType,
};

/// Request from client to daemon
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request {
    pub service: String,
    pub method: String,
    pub payload: Vec<u8>,
}

/// Response from daemon to client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Success { payload: Vec<u8> },
    Error(Status),
}

/// Failure reported by the daemon
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Status {
    pub code: String,
    pub message: String,
}

pub mod codes {
    use dscvr_core::error::DscvrError;

    pub const UNIMPLEMENTED: &str = "unimplemented";
    pub const INVALID_ARGUMENT: &str = "invalid_argument";
    pub const INTERNAL: &str = "internal";

    /// Classify a dispatch failure for the caller
    pub fn for_error(err: &DscvrError) -> &'static str {
        match err {
            DscvrError::UnknownMethod { .. } => UNIMPLEMENTED,
            DscvrError::InvalidRequest(_) => INVALID_ARGUMENT,
            e if e.is_decode_error() => INVALID_ARGUMENT,
            _ => INTERNAL,
        }
    }
}

impl Status {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }

    pub fn from_error(err: &DscvrError) -> Self {
        Self::new(codes::for_error(err), err.to_string())
    }
}

impl Default for Response {
    fn default() -> Self {
        Response::Success { payload: Vec::new() }
    }
}

impl Response {
    /// Turn the envelope into the call outcome
    pub fn into_result(self) -> Result<Vec<u8>> {
        match self {
            Response::Success { payload } => Ok(payload),
            Response::Error(status) => Err(DscvrError::Remote {
                code: status.code,
                message: status.message,
            }),
        }
    }
}

impl Message for Request {
    const NAME: &'static str = "dscvr.rpc.Request";

    fn encode_raw(&self, buf: &mut Vec<u8>) {
        if !self.service.is_empty() {
            put_string(buf, 1, &self.service);
        }
        if !self.method.is_empty() {
            put_string(buf, 2, &self.method);
        }
        if !self.payload.is_empty() {
            put_bytes(buf, 3, &self.payload);
        }
    }

    fn encoded_len(&self) -> usize {
        [(1, self.service.len()), (2, self.method.len()), (3, self.payload.len())]
            .into_iter()
            .filter(|&(_, len)| len > 0)
            .map(|(field, len)| bytes_field_len(field, len))
            .sum()
    }

    fn merge_field(
        &mut self,
        field: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<bool> {
        match (field, wire_type) {
            (1, WireType::LengthDelimited) => self.service = reader.read_string("service")?,
            (2, WireType::LengthDelimited) => self.method = reader.read_string("method")?,
            (3, WireType::LengthDelimited) => self.payload = reader.read_bytes()?.to_vec(),
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl Message for Status {
    const NAME: &'static str = "dscvr.rpc.Status";

    fn encode_raw(&self, buf: &mut Vec<u8>) {
        if !self.code.is_empty() {
            put_string(buf, 1, &self.code);
        }
        if !self.message.is_empty() {
            put_string(buf, 2, &self.message);
        }
    }

    fn encoded_len(&self) -> usize {
        let mut len = 0;
        if !self.code.is_empty() {
            len += bytes_field_len(1, self.code.len());
        }
        if !self.message.is_empty() {
            len += bytes_field_len(2, self.message.len());
        }
        len
    }

    fn merge_field(
        &mut self,
        field: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<bool> {
        match (field, wire_type) {
            (1, WireType::LengthDelimited) => self.code = reader.read_string("code")?,
            (2, WireType::LengthDelimited) => self.message = reader.read_string("message")?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

impl Message for Response {
    const NAME: &'static str = "dscvr.rpc.Response";

    fn encode_raw(&self, buf: &mut Vec<u8>) {
        match self {
            Response::Success { payload } if payload.is_empty() => {}
            Response::Success { payload } => put_bytes(buf, 1, payload),
            // An error is always emitted, even with an empty status
            Response::Error(status) => put_message(buf, 2, status),
        }
    }

    fn encoded_len(&self) -> usize {
        match self {
            Response::Success { payload } if payload.is_empty() => 0,
            Response::Success { payload } => bytes_field_len(1, payload.len()),
            Response::Error(status) => message_field_len(2, status),
        }
    }

    fn merge_field(
        &mut self,
        field: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<bool> {
        match (field, wire_type) {
            (1, WireType::LengthDelimited) => {
                *self = Response::Success {
                    payload: reader.read_bytes()?.to_vec(),
                };
            }
            (2, WireType::LengthDelimited) => {
                *self = Response::Error(Status::decode(reader.read_bytes()?)?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Write one length-prefixed frame
pub async fn write_frame<W>(writer: &mut W, frame: &[u8], max_frame_size: usize) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let len = u32::try_from(frame.len())
        .ok()
        .filter(|&len| len as usize <= max_frame_size)
        .ok_or_else(|| oversized(frame.len(), max_frame_size))?;

    writer.write_u32(len).await?;
    writer.write_all(frame).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame.
///
/// `None` only when the stream ends before the first header byte; a stream
/// that ends inside the header or body is an error.
pub async fn read_frame<R>(reader: &mut R, max_frame_size: usize) -> Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut header = [0u8; 4];
    let mut filled = 0;
    while filled < header.len() {
        let n = reader.read(&mut header[filled..]).await?;
        if n == 0 {
            if filled == 0 {
                return Ok(None);
            }
            return Err(DscvrError::Protocol(format!(
                "stream ended after {filled} of 4 header bytes"
            )));
        }
        filled += n;
    }

    let len = u32::from_be_bytes(header) as usize;
    if len > max_frame_size {
        return Err(oversized(len, max_frame_size));
    }

    let mut frame = vec![0u8; len];
    reader.read_exact(&mut frame).await?;
    Ok(Some(frame))
}

fn oversized(len: usize, max_frame_size: usize) -> DscvrError {
    DscvrError::Protocol(format!("frame of {len} bytes exceeds limit {max_frame_size}"))
}
