//! dscvr-daemon - Network transports for the file indexer service
//!
//! This crate binds the `FileIndexer` contract to a socket, two ways:
//! - gRPC over HTTP/2 (tonic), the wire the indexer backend speaks:
//!   `GrpcTransport` on the client side, `GrpcServer` to host a backend
//! - Length-prefixed frames carrying a request/response envelope:
//!   `TcpTransport` on the client side, `Daemon` to host a backend
//!
//! Both client sides implement `Transport` and plug into `FileIndexerClient`.

pub mod grpc;
pub mod protocol;
mod server;
mod transport;

pub use grpc::{GrpcServer, GrpcTransport};
pub use server::Daemon;
pub use transport::TcpTransport;
