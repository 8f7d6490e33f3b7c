//! dscvr-core - Wire codec and RPC contract for the dscvr file indexer
//!
//! This crate provides everything a front-end needs to talk to the indexing
//! backend:
//! - Varint/tag primitives and length-delimited framing
//! - The `file_indexer` message schema with encode/decode and a JSON view
//! - The `FileIndexer` service contract, a typed client and a dispatcher
//! - Configuration management

pub mod config;
pub mod error;
pub mod message;
pub mod service;
pub mod wire;

pub use config::Config;
pub use error::{DscvrError, Result};
pub use message::{
    DuplicatedFile, Empty, FindDuplicatedFilesQuery, FindDuplicatedFilesResponse, IndexFileQuery,
    JsonProjection, Message, MessageKind, ScannedFile, SearchFileByContentsQuery,
    SearchFileResponse,
};
pub use service::{
    FileIndexer, FileIndexerClient, FileIndexerService, Method, Transport, SERVICE_NAME,
};
