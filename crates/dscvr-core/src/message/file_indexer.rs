use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::wire::{
    bytes_field_len, message_field_len, put_bool, put_message, put_string, put_u64,
    varint_field_len, Reader, WireType,
};
use super::json::{is_false, is_zero, null_as_default};
use super::Message;

/// Field numbers for each message, stable across schema revisions
pub mod fields {
    pub mod scanned_file {
        pub const PATH: u32 = 1;
        pub const READABLE: u32 = 2;
        pub const HASH: u32 = 3;
    }

    pub mod index_file_query {
        pub const SCANNED_FILES: u32 = 1;
    }

    pub mod search_file_by_contents_query {
        pub const QUERY: u32 = 1;
    }

    pub mod search_file_response {
        pub const PATH: u32 = 1;
    }

    pub mod find_duplicated_files_query {
        pub const STARTING_AT_PATH: u32 = 1;
    }

    pub mod duplicated_file {
        pub const PATHS: u32 = 1;
        pub const AGGREGATED_SIZE: u32 = 2;
        pub const DUPLICATES: u32 = 3;
        pub const HASH: u32 = 4;
    }

    pub mod find_duplicated_files_response {
        pub const FILES: u32 = 1;
    }
}

/// One file observed by the backend scanner
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedFile {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub path: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "is_false")]
    pub readable: bool,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub hash: String,
}

impl ScannedFile {
    pub fn new(path: impl Into<String>, readable: bool, hash: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            readable,
            hash: hash.into(),
        }
    }
}

impl Message for ScannedFile {
    const NAME: &'static str = "file_indexer.ScannedFile";

    fn encode_raw(&self, buf: &mut Vec<u8>) {
        use fields::scanned_file::*;

        if !self.path.is_empty() {
            put_string(buf, PATH, &self.path);
        }
        if self.readable {
            put_bool(buf, READABLE, true);
        }
        if !self.hash.is_empty() {
            put_string(buf, HASH, &self.hash);
        }
    }

    fn encoded_len(&self) -> usize {
        use fields::scanned_file::*;

        let mut len = 0;
        if !self.path.is_empty() {
            len += bytes_field_len(PATH, self.path.len());
        }
        if self.readable {
            len += varint_field_len(READABLE, 1);
        }
        if !self.hash.is_empty() {
            len += bytes_field_len(HASH, self.hash.len());
        }
        len
    }

    fn merge_field(
        &mut self,
        field: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<bool> {
        use fields::scanned_file::*;

        match (field, wire_type) {
            (PATH, WireType::LengthDelimited) => self.path = reader.read_string("path")?,
            (READABLE, WireType::Varint) => self.readable = reader.read_bool()?,
            (HASH, WireType::LengthDelimited) => self.hash = reader.read_string("hash")?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Request to persist or update index entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexFileQuery {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub scanned_files: Vec<ScannedFile>,
}

impl Message for IndexFileQuery {
    const NAME: &'static str = "file_indexer.IndexFileQuery";

    fn encode_raw(&self, buf: &mut Vec<u8>) {
        for file in &self.scanned_files {
            put_message(buf, fields::index_file_query::SCANNED_FILES, file);
        }
    }

    fn encoded_len(&self) -> usize {
        self.scanned_files
            .iter()
            .map(|file| message_field_len(fields::index_file_query::SCANNED_FILES, file))
            .sum()
    }

    fn merge_field(
        &mut self,
        field: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<bool> {
        match (field, wire_type) {
            (fields::index_file_query::SCANNED_FILES, WireType::LengthDelimited) => {
                self.scanned_files.push(ScannedFile::decode(reader.read_bytes()?)?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Full-text search request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFileByContentsQuery {
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub query: String,
}

impl SearchFileByContentsQuery {
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into() }
    }
}

impl Message for SearchFileByContentsQuery {
    const NAME: &'static str = "file_indexer.SearchFileByContentsQuery";

    fn encode_raw(&self, buf: &mut Vec<u8>) {
        if !self.query.is_empty() {
            put_string(buf, fields::search_file_by_contents_query::QUERY, &self.query);
        }
    }

    fn encoded_len(&self) -> usize {
        if self.query.is_empty() {
            0
        } else {
            bytes_field_len(fields::search_file_by_contents_query::QUERY, self.query.len())
        }
    }

    fn merge_field(
        &mut self,
        field: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<bool> {
        match (field, wire_type) {
            (fields::search_file_by_contents_query::QUERY, WireType::LengthDelimited) => {
                self.query = reader.read_string("query")?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Matching paths, ordered by backend relevance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFileResponse {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
}

impl Message for SearchFileResponse {
    const NAME: &'static str = "file_indexer.SearchFileResponse";

    fn encode_raw(&self, buf: &mut Vec<u8>) {
        for path in &self.path {
            put_string(buf, fields::search_file_response::PATH, path);
        }
    }

    fn encoded_len(&self) -> usize {
        self.path
            .iter()
            .map(|path| bytes_field_len(fields::search_file_response::PATH, path.len()))
            .sum()
    }

    fn merge_field(
        &mut self,
        field: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<bool> {
        match (field, wire_type) {
            (fields::search_file_response::PATH, WireType::LengthDelimited) => {
                self.path.push(reader.read_string("path")?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Request for duplicate groups, optionally rooted at a path.
///
/// `None` and `Some("")` are distinct on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindDuplicatedFilesQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub starting_at_path: Option<String>,
}

impl FindDuplicatedFilesQuery {
    pub fn starting_at(path: impl Into<String>) -> Self {
        Self {
            starting_at_path: Some(path.into()),
        }
    }
}

impl Message for FindDuplicatedFilesQuery {
    const NAME: &'static str = "file_indexer.FindDuplicatedFilesQuery";

    fn encode_raw(&self, buf: &mut Vec<u8>) {
        if let Some(path) = &self.starting_at_path {
            put_string(buf, fields::find_duplicated_files_query::STARTING_AT_PATH, path);
        }
    }

    fn encoded_len(&self) -> usize {
        self.starting_at_path
            .as_ref()
            .map(|path| {
                bytes_field_len(fields::find_duplicated_files_query::STARTING_AT_PATH, path.len())
            })
            .unwrap_or(0)
    }

    fn merge_field(
        &mut self,
        field: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<bool> {
        match (field, wire_type) {
            (fields::find_duplicated_files_query::STARTING_AT_PATH, WireType::LengthDelimited) => {
                self.starting_at_path = Some(reader.read_string("startingAtPath")?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// A group of files sharing the same content hash
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicatedFile {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub paths: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "is_zero")]
    pub aggregated_size: u64,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "is_zero")]
    pub duplicates: u64,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub hash: String,
}

impl Message for DuplicatedFile {
    const NAME: &'static str = "file_indexer.DuplicatedFile";

    fn encode_raw(&self, buf: &mut Vec<u8>) {
        use fields::duplicated_file::*;

        for path in &self.paths {
            put_string(buf, PATHS, path);
        }
        if self.aggregated_size != 0 {
            put_u64(buf, AGGREGATED_SIZE, self.aggregated_size);
        }
        if self.duplicates != 0 {
            put_u64(buf, DUPLICATES, self.duplicates);
        }
        if !self.hash.is_empty() {
            put_string(buf, HASH, &self.hash);
        }
    }

    fn encoded_len(&self) -> usize {
        use fields::duplicated_file::*;

        let mut len: usize = self.paths.iter().map(|path| bytes_field_len(PATHS, path.len())).sum();
        if self.aggregated_size != 0 {
            len += varint_field_len(AGGREGATED_SIZE, self.aggregated_size);
        }
        if self.duplicates != 0 {
            len += varint_field_len(DUPLICATES, self.duplicates);
        }
        if !self.hash.is_empty() {
            len += bytes_field_len(HASH, self.hash.len());
        }
        len
    }

    fn merge_field(
        &mut self,
        field: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<bool> {
        use fields::duplicated_file::*;

        match (field, wire_type) {
            (PATHS, WireType::LengthDelimited) => self.paths.push(reader.read_string("paths")?),
            (AGGREGATED_SIZE, WireType::Varint) => self.aggregated_size = reader.read_u64()?,
            (DUPLICATES, WireType::Varint) => self.duplicates = reader.read_u64()?,
            (HASH, WireType::LengthDelimited) => self.hash = reader.read_string("hash")?,
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// All duplicate groups known to the backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindDuplicatedFilesResponse {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<DuplicatedFile>,
}

impl Message for FindDuplicatedFilesResponse {
    const NAME: &'static str = "file_indexer.FindDuplicatedFilesResponse";

    fn encode_raw(&self, buf: &mut Vec<u8>) {
        for file in &self.files {
            put_message(buf, fields::find_duplicated_files_response::FILES, file);
        }
    }

    fn encoded_len(&self) -> usize {
        self.files
            .iter()
            .map(|file| message_field_len(fields::find_duplicated_files_response::FILES, file))
            .sum()
    }

    fn merge_field(
        &mut self,
        field: u32,
        wire_type: WireType,
        reader: &mut Reader<'_>,
    ) -> Result<bool> {
        match (field, wire_type) {
            (fields::find_duplicated_files_response::FILES, WireType::LengthDelimited) => {
                self.files.push(DuplicatedFile::decode(reader.read_bytes()?)?);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Acknowledgement with no payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

impl Message for Empty {
    const NAME: &'static str = "proto_utils.Empty";

    fn encode_raw(&self, _buf: &mut Vec<u8>) {}

    fn encoded_len(&self) -> usize {
        0
    }

    fn merge_field(
        &mut self,
        _field: u32,
        _wire_type: WireType,
        _reader: &mut Reader<'_>,
    ) -> Result<bool> {
        Ok(false)
    }
}
