//! Message schema and codec for the file indexer service
//!
//! Every message is a plain value type. Encoding omits default-valued scalars,
//! emits repeated fields element by element, and always emits present optional
//! fields. Decoding dispatches on field number, skips unknown fields, and
//! fills in defaults for anything missing on the wire.

mod file_indexer;
pub mod json;

pub use file_indexer::{
    fields, DuplicatedFile, Empty, FindDuplicatedFilesQuery, FindDuplicatedFilesResponse,
    IndexFileQuery, ScannedFile, SearchFileByContentsQuery, SearchFileResponse,
};
pub use json::JsonProjection;

use std::str::FromStr;

use crate::error::{DscvrError, Result};
use crate::wire::{Reader, WireType};

/// A message that can be written to and read from the wire
pub trait Message: Default + Sized {
    /// Fully-qualified schema name
    const NAME: &'static str;

    /// Append the encoded fields to `buf`, in ascending field-number order
    fn encode_raw(&self, buf: &mut Vec<u8>);

    /// Exact number of bytes `encode_raw` appends
    fn encoded_len(&self) -> usize;

    /// Merge a single field read from the wire.
    ///
    /// Returns `Ok(false)` when the field number is unknown or the wire type
    /// does not match the schema; the caller then skips the value.
    fn merge_field(
        &mut self,
        field: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<bool>;

    fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_raw(&mut buf);
        buf
    }

    fn decode(bytes: &[u8]) -> Result<Self> {
        let mut message = Self::default();
        let mut reader = Reader::new(bytes);

        while !reader.is_empty() {
            let (field, wire_type) = reader.read_tag()?;
            if !message.merge_field(field, wire_type, &mut reader)? {
                tracing::trace!("{}: skipping field {} ({:?})", Self::NAME, field, wire_type);
                reader.skip(field, wire_type)?;
            }
        }

        Ok(message)
    }
}

/// Names every message type, for inspecting raw buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    ScannedFile,
    IndexFileQuery,
    SearchFileByContentsQuery,
    SearchFileResponse,
    FindDuplicatedFilesQuery,
    DuplicatedFile,
    FindDuplicatedFilesResponse,
    Empty,
}

impl MessageKind {
    pub const ALL: [MessageKind; 8] = [
        MessageKind::ScannedFile,
        MessageKind::IndexFileQuery,
        MessageKind::SearchFileByContentsQuery,
        MessageKind::SearchFileResponse,
        MessageKind::FindDuplicatedFilesQuery,
        MessageKind::DuplicatedFile,
        MessageKind::FindDuplicatedFilesResponse,
        MessageKind::Empty,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MessageKind::ScannedFile => ScannedFile::NAME,
            MessageKind::IndexFileQuery => IndexFileQuery::NAME,
            MessageKind::SearchFileByContentsQuery => SearchFileByContentsQuery::NAME,
            MessageKind::SearchFileResponse => SearchFileResponse::NAME,
            MessageKind::FindDuplicatedFilesQuery => FindDuplicatedFilesQuery::NAME,
            MessageKind::DuplicatedFile => DuplicatedFile::NAME,
            MessageKind::FindDuplicatedFilesResponse => FindDuplicatedFilesResponse::NAME,
            MessageKind::Empty => Empty::NAME,
        }
    }

    /// Decode `bytes` as this kind and render its JSON projection
    pub fn decode_to_json(self, bytes: &[u8]) -> Result<serde_json::Value> {
        Ok(match self {
            MessageKind::ScannedFile => ScannedFile::decode(bytes)?.to_json(),
            MessageKind::IndexFileQuery => IndexFileQuery::decode(bytes)?.to_json(),
            MessageKind::SearchFileByContentsQuery => {
                SearchFileByContentsQuery::decode(bytes)?.to_json()
            }
            MessageKind::SearchFileResponse => SearchFileResponse::decode(bytes)?.to_json(),
            MessageKind::FindDuplicatedFilesQuery => {
                FindDuplicatedFilesQuery::decode(bytes)?.to_json()
            }
            MessageKind::DuplicatedFile => DuplicatedFile::decode(bytes)?.to_json(),
            MessageKind::FindDuplicatedFilesResponse => {
                FindDuplicatedFilesResponse::decode(bytes)?.to_json()
            }
            MessageKind::Empty => Empty::decode(bytes)?.to_json(),
        })
    }
}

impl FromStr for MessageKind {
    type Err = DscvrError;

    /// Accepts the bare or fully-qualified name, e.g. `DuplicatedFile`
    /// or `file_indexer.DuplicatedFile`
    fn from_str(s: &str) -> Result<Self> {
        MessageKind::ALL
            .into_iter()
            .find(|kind| {
                let name = kind.name();
                name == s || name.rsplit('.').next() == Some(s)
            })
            .ok_or_else(|| DscvrError::InvalidRequest(format!("unknown message type: {s}")))
    }
}

impl std::fmt::Display for MessageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_kind_from_str() {
        assert_eq!("DuplicatedFile".parse::<MessageKind>().unwrap(), MessageKind::DuplicatedFile);
        assert_eq!(
            "file_indexer.SearchFileResponse".parse::<MessageKind>().unwrap(),
            MessageKind::SearchFileResponse
        );
        assert_eq!("proto_utils.Empty".parse::<MessageKind>().unwrap(), MessageKind::Empty);
        assert!("Nope".parse::<MessageKind>().is_err());
    }

    #[test]
    fn test_decode_to_json() -> Result<()> {
        let response = SearchFileResponse {
            path: vec!["a".into(), "b".into()],
        };
        let json = MessageKind::SearchFileResponse.decode_to_json(&response.encode())?;
        assert_eq!(json, serde_json::json!({ "path": ["a", "b"] }));
        Ok(())
    }

    #[test]
    fn test_decode_to_json_propagates_errors() {
        let err = MessageKind::ScannedFile.decode_to_json(&[0x0a, 0x05, b'x']).unwrap_err();
        assert!(err.is_decode_error());
    }
}
