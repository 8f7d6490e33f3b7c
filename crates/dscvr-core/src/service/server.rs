use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{DscvrError, Result};
use crate::message::{FindDuplicatedFilesQuery, IndexFileQuery, Message, SearchFileByContentsQuery};
use super::{FileIndexer, Method, Transport, SERVICE_NAME};

/// Routes encoded calls to a [`FileIndexer`] backend
pub struct FileIndexerService<H: ?Sized> {
    service: String,
    handler: Arc<H>,
}

impl<H: FileIndexer + ?Sized> FileIndexerService<H> {
    pub fn new(handler: Arc<H>) -> Self {
        Self::with_service_name(handler, SERVICE_NAME)
    }

    pub fn with_service_name(handler: Arc<H>, service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            handler,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service
    }

    /// Decode the request for `method`, run the handler, encode its response
    pub async fn dispatch(&self, service: &str, method: &str, payload: &[u8]) -> Result<Vec<u8>> {
        let unknown = || DscvrError::UnknownMethod {
            service: service.to_string(),
            method: method.to_string(),
        };

        if service != self.service {
            return Err(unknown());
        }
        let method = Method::from_name(method).ok_or_else(unknown)?;
        tracing::debug!("dispatching {}/{} ({} bytes)", self.service, method, payload.len());

        let response = match method {
            Method::IndexFile => {
                let request = IndexFileQuery::decode(payload)?;
                self.handler.index_file(request).await?.encode()
            }
            Method::SearchFileByContents => {
                let request = SearchFileByContentsQuery::decode(payload)?;
                self.handler.search_file_by_contents(request).await?.encode()
            }
            Method::FindDuplicatedFiles => {
                let request = FindDuplicatedFilesQuery::decode(payload)?;
                self.handler.find_duplicated_files(request).await?.encode()
            }
        };

        Ok(response)
    }
}

impl<H: ?Sized> Clone for FileIndexerService<H> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

/// In-process transport: calls go straight to the handler
#[async_trait]
impl<H: FileIndexer + ?Sized> Transport for FileIndexerService<H> {
    async fn invoke(&self, service: &str, method: &str, payload: Vec<u8>) -> Result<Vec<u8>> {
        self.dispatch(service, method, &payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{
        DuplicatedFile, Empty, FindDuplicatedFilesResponse, ScannedFile, SearchFileResponse,
    };
    use crate::service::FileIndexerClient;
    use std::sync::Mutex;

    /// Keeps scanned files in memory and answers from them
    #[derive(Default)]
    struct MemoryIndexer {
        files: Mutex<Vec<ScannedFile>>,
    }

    #[async_trait]
    impl FileIndexer for MemoryIndexer {
        async fn index_file(&self, request: IndexFileQuery) -> Result<Empty> {
            self.files.lock().unwrap().extend(request.scanned_files);
            Ok(Empty {})
        }

        async fn search_file_by_contents(
            &self,
            request: SearchFileByContentsQuery,
        ) -> Result<SearchFileResponse> {
            if request.query.is_empty() {
                return Err(DscvrError::InvalidRequest("empty query".to_string()));
            }
            let files = self.files.lock().unwrap();
            Ok(SearchFileResponse {
                path: files
                    .iter()
                    .filter(|f| f.path.contains(&request.query))
                    .map(|f| f.path.clone())
                    .collect(),
            })
        }

        async fn find_duplicated_files(
            &self,
            request: FindDuplicatedFilesQuery,
        ) -> Result<FindDuplicatedFilesResponse> {
            let prefix = request.starting_at_path.unwrap_or_default();
            let files = self.files.lock().unwrap();
            let mut groups: Vec<DuplicatedFile> = Vec::new();
            for file in files.iter().filter(|f| f.path.starts_with(&prefix)) {
                match groups.iter_mut().find(|g| g.hash == file.hash) {
                    Some(group) => {
                        group.paths.push(file.path.clone());
                        group.duplicates += 1;
                    }
                    None => groups.push(DuplicatedFile {
                        paths: vec![file.path.clone()],
                        aggregated_size: 0,
                        duplicates: 1,
                        hash: file.hash.clone(),
                    }),
                }
            }
            groups.retain(|g| g.duplicates > 1);
            Ok(FindDuplicatedFilesResponse { files: groups })
        }
    }

    fn loopback() -> FileIndexerClient<FileIndexerService<MemoryIndexer>> {
        FileIndexerClient::new(FileIndexerService::new(Arc::new(MemoryIndexer::default())))
    }

    #[tokio::test]
    async fn test_loopback_round_trip() -> Result<()> {
        let client = loopback();
        client
            .index_file(IndexFileQuery {
                scanned_files: vec![
                    ScannedFile::new("/docs/report.txt", true, "aa"),
                    ScannedFile::new("/backup/report.txt", true, "aa"),
                    ScannedFile::new("/docs/notes.txt", true, "bb"),
                ],
            })
            .await?;

        let found = client
            .search_file_by_contents(SearchFileByContentsQuery::new("report"))
            .await?;
        assert_eq!(found.path, vec!["/docs/report.txt", "/backup/report.txt"]);

        let duplicates = client.find_duplicated_files(FindDuplicatedFilesQuery::default()).await?;
        assert_eq!(duplicates.files.len(), 1);
        assert_eq!(duplicates.files[0].hash, "aa");
        assert_eq!(duplicates.files[0].duplicates, 2);

        let scoped = client
            .find_duplicated_files(FindDuplicatedFilesQuery::starting_at("/docs"))
            .await?;
        assert!(scoped.files.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_calls() -> Result<()> {
        let client = loopback();
        client
            .index_file(IndexFileQuery {
                scanned_files: vec![
                    ScannedFile::new("/x/a", true, "1"),
                    ScannedFile::new("/y/a", true, "1"),
                ],
            })
            .await?;

        let (search, dupes) = tokio::join!(
            client.search_file_by_contents(SearchFileByContentsQuery::new("/x")),
            client.find_duplicated_files(FindDuplicatedFilesQuery::default()),
        );
        assert_eq!(search?.path, vec!["/x/a"]);
        assert_eq!(dupes?.files[0].paths, vec!["/x/a", "/y/a"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_handler_error_reaches_caller() {
        let client = loopback();
        let err = client
            .search_file_by_contents(SearchFileByContentsQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DscvrError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn test_unknown_method_and_service() {
        let service = FileIndexerService::new(Arc::new(MemoryIndexer::default()));

        let err = service.dispatch(SERVICE_NAME, "DeleteFile", &[]).await.unwrap_err();
        assert!(
            matches!(err, DscvrError::UnknownMethod { ref method, .. } if method == "DeleteFile")
        );

        let err = service.dispatch("other.Service", "IndexFile", &[]).await.unwrap_err();
        assert!(matches!(
            err,
            DscvrError::UnknownMethod { ref service, .. } if service == "other.Service"
        ));
    }

    #[tokio::test]
    async fn test_malformed_request_is_rejected() {
        let service = FileIndexerService::new(Arc::new(MemoryIndexer::default()));
        let err = service
            .dispatch(SERVICE_NAME, "SearchFileByContents", &[0x0a, 0x80])
            .await
            .unwrap_err();
        assert!(matches!(err, DscvrError::MalformedVarint));
    }
}
