//! RPC contract for the `FileIndexer` service
//!
//! Each method maps one request message to one response message. Calls go
//! through a [`Transport`], which only ever sees the service name, the method
//! name and opaque bytes.

mod client;
mod server;

pub use client::FileIndexerClient;
pub use server::FileIndexerService;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::message::{
    Empty, FindDuplicatedFilesQuery, FindDuplicatedFilesResponse, IndexFileQuery,
    SearchFileByContentsQuery, SearchFileResponse,
};

/// Fully-qualified name of the indexer service
pub const SERVICE_NAME: &str = "file_indexer.FileIndexer";

/// Remote methods exposed by the indexer service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    IndexFile,
    SearchFileByContents,
    FindDuplicatedFiles,
}

impl Method {
    pub const ALL: [Method; 3] = [
        Method::IndexFile,
        Method::SearchFileByContents,
        Method::FindDuplicatedFiles,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Method::IndexFile => "IndexFile",
            Method::SearchFileByContents => "SearchFileByContents",
            Method::FindDuplicatedFiles => "FindDuplicatedFiles",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Method::ALL.into_iter().find(|method| method.as_str() == name)
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Carries an encoded request to the backend and returns the encoded response
#[async_trait]
pub trait Transport: Send + Sync {
    async fn invoke(&self, service: &str, method: &str, payload: Vec<u8>) -> Result<Vec<u8>>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn invoke(&self, service: &str, method: &str, payload: Vec<u8>) -> Result<Vec<u8>> {
        (**self).invoke(service, method, payload).await
    }
}

/// The indexer service as seen by both callers and backends
#[async_trait]
pub trait FileIndexer: Send + Sync {
    async fn index_file(&self, request: IndexFileQuery) -> Result<Empty>;

    async fn search_file_by_contents(
        &self,
        request: SearchFileByContentsQuery,
    ) -> Result<SearchFileResponse>;

    async fn find_duplicated_files(
        &self,
        request: FindDuplicatedFilesQuery,
    ) -> Result<FindDuplicatedFilesResponse>;
}

#[async_trait]
impl<H: FileIndexer + ?Sized> FileIndexer for Arc<H> {
    async fn index_file(&self, request: IndexFileQuery) -> Result<Empty> {
        (**self).index_file(request).await
    }

    async fn search_file_by_contents(
        &self,
        request: SearchFileByContentsQuery,
    ) -> Result<SearchFileResponse> {
        (**self).search_file_by_contents(request).await
    }

    async fn find_duplicated_files(
        &self,
        request: FindDuplicatedFilesQuery,
    ) -> Result<FindDuplicatedFilesResponse> {
        (**self).find_duplicated_files(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_names() {
        for method in Method::ALL {
            assert_eq!(Method::from_name(method.as_str()), Some(method));
        }
        assert_eq!(Method::SearchFileByContents.to_string(), "SearchFileByContents");
        assert_eq!(Method::from_name("indexFile"), None);
    }
}
