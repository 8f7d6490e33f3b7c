use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};

use dscvr_core::config::DaemonConfig;
use dscvr_core::error::Result;
use dscvr_core::message::Message;
use dscvr_core::service::{FileIndexer, FileIndexerService};

use crate::protocol::{codes, read_frame, write_frame, Request, Response, Status};

/// Serves a [`FileIndexer`] backend over TCP
pub struct Daemon<H: ?Sized> {
    service: FileIndexerService<H>,
    address: String,
    limits: Limits,
}

/// Per-connection limits
#[derive(Debug, Clone, Copy)]
struct Limits {
    max_frame_size: usize,
    idle_timeout: Option<Duration>,
}

impl<H: FileIndexer + ?Sized + 'static> Daemon<H> {
    pub fn new(handler: Arc<H>, config: &DaemonConfig) -> Self {
        Self {
            service: FileIndexerService::new(handler),
            address: config.address(),
            limits: Limits {
                max_frame_size: config.max_frame_size,
                idle_timeout: (config.idle_timeout_ms > 0)
                    .then(|| Duration::from_millis(config.idle_timeout_ms)),
            },
        }
    }

    /// Bind to the configured address and serve forever
    pub async fn listen(self) -> Result<()> {
        let listener = TcpListener::bind(&self.address).await?;
        self.serve(listener).await
    }

    /// Accept connections until the listener fails
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        self.serve_with_shutdown(listener, std::future::pending()).await
    }

    /// Accept connections until `shutdown` resolves
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!("listening on {}", addr);
        }

        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("shutting down");
                    return Ok(());
                }
                accepted = listener.accept() => {
                    let (stream, peer) = accepted?;
                    tracing::debug!("connection from {}", peer);

                    let service = self.service.clone();
                    let limits = self.limits;
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(service, stream, limits).await {
                            tracing::warn!("connection from {} failed: {}", peer, e);
                        }
                    });
                }
            }
        }
    }
}

/// Serve sequential calls on one connection until the peer hangs up or goes idle
async fn handle_connection<H>(
    service: FileIndexerService<H>,
    mut stream: TcpStream,
    limits: Limits,
) -> Result<()>
where
    H: FileIndexer + ?Sized,
{
    let max_frame_size = limits.max_frame_size;

    loop {
        let next = read_frame(&mut stream, max_frame_size);
        let frame = match limits.idle_timeout {
            Some(idle) => match tokio::time::timeout(idle, next).await {
                Ok(frame) => frame?,
                Err(_) => {
                    tracing::debug!("closing connection idle for {:?}", idle);
                    return Ok(());
                }
            },
            None => next.await?,
        };
        let Some(frame) = frame else {
            return Ok(());
        };

        let response = match Request::decode(&frame) {
            Ok(request) => {
                let outcome = service
                    .dispatch(&request.service, &request.method, &request.payload)
                    .await;
                match outcome {
                    Ok(payload) => Response::Success { payload },
                    Err(e) => {
                        tracing::debug!("{}/{} failed: {}", request.service, request.method, e);
                        Response::Error(Status::from_error(&e))
                    }
                }
            }
            Err(e) => Response::Error(Status::new(
                codes::INVALID_ARGUMENT,
                format!("bad request envelope: {e}"),
            )),
        };

        let mut encoded = response.encode();
        if encoded.len() > max_frame_size {
            let status = Status::new(codes::INTERNAL, "response exceeds frame limit");
            encoded = Response::Error(status).encode();
        }
        write_frame(&mut stream, &encoded, max_frame_size).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TcpTransport;
    use async_trait::async_trait;
    use dscvr_core::error::DscvrError;
    use dscvr_core::message::{
        DuplicatedFile, Empty, FindDuplicatedFilesQuery, FindDuplicatedFilesResponse,
        IndexFileQuery, SearchFileByContentsQuery, SearchFileResponse,
    };
    use dscvr_core::service::{FileIndexerClient, Transport, SERVICE_NAME};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::AsyncReadExt;
    use tokio::sync::oneshot;

    #[derive(Default)]
    struct StubIndexer {
        indexed: AtomicUsize,
    }

    #[async_trait]
    impl FileIndexer for StubIndexer {
        async fn index_file(&self, request: IndexFileQuery) -> Result<Empty> {
            self.indexed.fetch_add(request.scanned_files.len(), Ordering::SeqCst);
            Ok(Empty {})
        }

        async fn search_file_by_contents(
            &self,
            request: SearchFileByContentsQuery,
        ) -> Result<SearchFileResponse> {
            if request.query == "slow" {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Ok(SearchFileResponse {
                path: vec![format!("/hits/{}", request.query), "/hits/other".to_string()],
            })
        }

        async fn find_duplicated_files(
            &self,
            request: FindDuplicatedFilesQuery,
        ) -> Result<FindDuplicatedFilesResponse> {
            let root = request.starting_at_path.unwrap_or_else(|| "/".to_string());
            Ok(FindDuplicatedFilesResponse {
                files: vec![DuplicatedFile {
                    paths: vec![format!("{root}a.bin"), format!("{root}b.bin")],
                    aggregated_size: 9_007_199_254_740_993,
                    duplicates: 2,
                    hash: "deadbeef".to_string(),
                }],
            })
        }
    }

    async fn start(handler: Arc<StubIndexer>) -> (String, oneshot::Sender<()>) {
        start_with(handler, &DaemonConfig::default()).await
    }

    async fn start_with(
        handler: Arc<StubIndexer>,
        config: &DaemonConfig,
    ) -> (String, oneshot::Sender<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let (tx, rx) = oneshot::channel();

        let daemon = Daemon::new(handler, config);
        tokio::spawn(daemon.serve_with_shutdown(listener, async move {
            let _ = rx.await;
        }));

        (address, tx)
    }

    #[tokio::test]
    async fn test_calls_over_tcp() -> Result<()> {
        let handler = Arc::new(StubIndexer::default());
        let (address, _shutdown) = start(handler.clone()).await;
        let client = FileIndexerClient::new(TcpTransport::new(address));

        client
            .index_file(IndexFileQuery {
                scanned_files: vec![Default::default(), Default::default()],
            })
            .await?;
        assert_eq!(handler.indexed.load(Ordering::SeqCst), 2);

        let found = client
            .search_file_by_contents(SearchFileByContentsQuery::new("report"))
            .await?;
        assert_eq!(found.path, vec!["/hits/report", "/hits/other"]);

        let duplicates = client
            .find_duplicated_files(FindDuplicatedFilesQuery::starting_at("/data/"))
            .await?;
        assert_eq!(duplicates.files[0].paths, vec!["/data/a.bin", "/data/b.bin"]);
        assert_eq!(duplicates.files[0].aggregated_size, 9_007_199_254_740_993);
        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_clients() -> Result<()> {
        let (address, _shutdown) = start(Arc::new(StubIndexer::default())).await;
        let client = Arc::new(FileIndexerClient::new(TcpTransport::new(address)));

        let mut tasks = Vec::new();
        for i in 0..8 {
            let client = client.clone();
            tasks.push(tokio::spawn(async move {
                client
                    .search_file_by_contents(SearchFileByContentsQuery::new(format!("q{i}")))
                    .await
            }));
        }

        for (i, task) in tasks.into_iter().enumerate() {
            let response = task.await.unwrap()?;
            assert_eq!(response.path[0], format!("/hits/q{i}"));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_method_is_reported() {
        let (address, _shutdown) = start(Arc::new(StubIndexer::default())).await;
        let transport = TcpTransport::new(address);

        let err = transport
            .invoke(SERVICE_NAME, "DeleteEverything", Vec::new())
            .await
            .unwrap_err();
        match err {
            DscvrError::Remote { code, .. } => assert_eq!(code, codes::UNIMPLEMENTED),
            other => panic!("expected remote error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_payload_is_invalid_argument() {
        let (address, _shutdown) = start(Arc::new(StubIndexer::default())).await;
        let transport = TcpTransport::new(address);

        let err = transport
            .invoke(SERVICE_NAME, "SearchFileByContents", vec![0x0a, 0x10, b'x'])
            .await
            .unwrap_err();
        assert!(
            matches!(err, DscvrError::Remote { ref code, .. } if code == codes::INVALID_ARGUMENT)
        );
    }

    #[tokio::test]
    async fn test_request_timeout() {
        let (address, _shutdown) = start(Arc::new(StubIndexer::default())).await;
        let client = FileIndexerClient::new(
            TcpTransport::new(address).with_request_timeout(Some(Duration::from_millis(100))),
        );

        let err = client
            .search_file_by_contents(SearchFileByContentsQuery::new("slow"))
            .await
            .unwrap_err();
        assert!(matches!(err, DscvrError::Timeout));
    }

    #[tokio::test]
    async fn test_idle_connection_is_closed() {
        let config = DaemonConfig {
            idle_timeout_ms: 50,
            ..Default::default()
        };
        let (address, _shutdown) = start_with(Arc::new(StubIndexer::default()), &config).await;

        let mut stream = TcpStream::connect(&address).await.unwrap();
        let mut buf = [0u8; 1];
        let read = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut buf))
            .await
            .expect("daemon kept an idle connection open");
        assert_eq!(read.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_active_connection_survives_idle_timeout() -> Result<()> {
        let config = DaemonConfig {
            idle_timeout_ms: 200,
            ..Default::default()
        };
        let (address, _shutdown) = start_with(Arc::new(StubIndexer::default()), &config).await;
        let mut stream = TcpStream::connect(&address).await?;

        for _ in 0..3 {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let request = Request {
                service: SERVICE_NAME.to_string(),
                method: "IndexFile".to_string(),
                payload: Vec::new(),
            };
            write_frame(&mut stream, &request.encode(), 1024).await?;
            let frame = read_frame(&mut stream, 1024).await?;
            assert_eq!(frame.map(|f| Response::decode(&f)).transpose()?, Some(Response::default()));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_failure() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let client = FileIndexerClient::new(TcpTransport::new(address));
        let err = client
            .find_duplicated_files(FindDuplicatedFilesQuery::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DscvrError::TransportFailure(_)));
    }
}
