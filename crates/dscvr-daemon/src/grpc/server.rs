use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::body::BoxBody;
use tonic::codegen::{http, Body, BoxFuture, Service, StdError};
use tonic::server::{Grpc, NamedService, UnaryService};
use tonic::Code;

use dscvr_core::config::IndexerConfig;
use dscvr_core::error::{DscvrError, Result};
use dscvr_core::service::{FileIndexer, FileIndexerService, SERVICE_NAME};

use crate::protocol::codes;
use super::BytesCodec;

/// Serves a [`FileIndexer`] backend as the gRPC `file_indexer.FileIndexer` service
pub struct GrpcServer<H: ?Sized> {
    routes: Routes<H>,
    address: String,
}

impl<H: FileIndexer + ?Sized + 'static> GrpcServer<H> {
    pub fn new(handler: Arc<H>, config: &IndexerConfig) -> Self {
        Self {
            routes: Routes {
                service: FileIndexerService::new(handler),
                max_message_size: config.max_message_size,
            },
            address: config.address(),
        }
    }

    /// Bind to the configured address and serve forever
    pub async fn listen(self) -> Result<()> {
        let listener = TcpListener::bind(&self.address).await?;
        self.serve_with_shutdown(listener, std::future::pending()).await
    }

    /// Accept connections until `shutdown` resolves
    pub async fn serve_with_shutdown<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!("gRPC listening on {}", addr);
        }

        tonic::transport::Server::builder()
            .add_service(self.routes)
            .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
            .await
            .map_err(DscvrError::transport)
    }
}

/// Routes every method of the service into the dispatcher
struct Routes<H: ?Sized> {
    service: FileIndexerService<H>,
    max_message_size: usize,
}

impl<H: ?Sized> Clone for Routes<H> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            max_message_size: self.max_message_size,
        }
    }
}

impl<H: ?Sized> NamedService for Routes<H> {
    const NAME: &'static str = SERVICE_NAME;
}

impl<H, B> Service<http::Request<B>> for Routes<H>
where
    H: FileIndexer + ?Sized + 'static,
    B: Body + Send + 'static,
    B::Error: Into<StdError> + Send + 'static,
{
    type Response = http::Response<BoxBody>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: http::Request<B>) -> Self::Future {
        let method = req.uri().path().rsplit('/').next().unwrap_or("").to_string();
        let call = UnaryCall {
            service: self.service.clone(),
            method,
        };
        let max_message_size = self.max_message_size;

        Box::pin(async move {
            let mut grpc = Grpc::new(BytesCodec)
                .max_decoding_message_size(max_message_size)
                .max_encoding_message_size(max_message_size);
            Ok(grpc.unary(call, req).await)
        })
    }
}

/// One unary call bound to a method name
struct UnaryCall<H: ?Sized> {
    service: FileIndexerService<H>,
    method: String,
}

impl<H: FileIndexer + ?Sized + 'static> UnaryService<Vec<u8>> for UnaryCall<H> {
    type Response = Vec<u8>;
    type Future = BoxFuture<tonic::Response<Vec<u8>>, tonic::Status>;

    fn call(&mut self, request: tonic::Request<Vec<u8>>) -> Self::Future {
        let service = self.service.clone();
        let method = std::mem::take(&mut self.method);

        Box::pin(async move {
            let payload = request.into_inner();
            match service.dispatch(service.service_name(), &method, &payload).await {
                Ok(response) => Ok(tonic::Response::new(response)),
                Err(e) => {
                    tracing::debug!("{}/{} failed: {}", service.service_name(), method, e);
                    Err(status_from_error(&e))
                }
            }
        })
    }
}

fn status_from_error(err: &DscvrError) -> tonic::Status {
    let code = match codes::for_error(err) {
        codes::UNIMPLEMENTED => Code::Unimplemented,
        codes::INVALID_ARGUMENT => Code::InvalidArgument,
        _ => Code::Internal,
    };
    tonic::Status::new(code, err.to_string())
}
