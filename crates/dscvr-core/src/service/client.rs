use async_trait::async_trait;

use crate::error::Result;
use crate::message::{
    Empty, FindDuplicatedFilesQuery, FindDuplicatedFilesResponse, IndexFileQuery, Message,
    SearchFileByContentsQuery, SearchFileResponse,
};
use super::{FileIndexer, Method, Transport, SERVICE_NAME};

/// Typed client for the indexer service over any [`Transport`]
#[derive(Debug, Clone)]
pub struct FileIndexerClient<T> {
    transport: T,
    service: String,
}

impl<T: Transport> FileIndexerClient<T> {
    pub fn new(transport: T) -> Self {
        Self::with_service_name(transport, SERVICE_NAME)
    }

    /// Address the service under a different name
    pub fn with_service_name(transport: T, service: impl Into<String>) -> Self {
        Self {
            transport,
            service: service.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// One request, one response. No retries.
    async fn call<Req, Resp>(&self, method: Method, request: &Req) -> Result<Resp>
    where
        Req: Message,
        Resp: Message,
    {
        let payload = request.encode();
        tracing::debug!("{}/{}: sending {} bytes", self.service, method, payload.len());

        let response = self
            .transport
            .invoke(&self.service, method.as_str(), payload)
            .await
            .inspect_err(|e| {
                tracing::debug!("{}/{} failed in flight: {}", self.service, method, e)
            })?;

        tracing::debug!("{}/{}: received {} bytes", self.service, method, response.len());
        Resp::decode(&response)
            .inspect_err(|e| {
                tracing::debug!("{}/{}: bad {}: {}", self.service, method, Resp::NAME, e)
            })
    }
}

#[async_trait]
impl<T: Transport> FileIndexer for FileIndexerClient<T> {
    async fn index_file(&self, request: IndexFileQuery) -> Result<Empty> {
        self.call(Method::IndexFile, &request).await
    }

    async fn search_file_by_contents(
        &self,
        request: SearchFileByContentsQuery,
    ) -> Result<SearchFileResponse> {
        self.call(Method::SearchFileByContents, &request).await
    }

    async fn find_duplicated_files(
        &self,
        request: FindDuplicatedFilesQuery,
    ) -> Result<FindDuplicatedFilesResponse> {
        self.call(Method::FindDuplicatedFiles, &request).await
    }
}
