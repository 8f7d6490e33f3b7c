//! gRPC binding of the indexer service, wire-compatible with the indexer
//!
//! Calls travel as unary gRPC requests on `/{service}/{method}`. Payloads are
//! the codec's own bytes, so no generated stubs are involved.

mod client;
mod codec;
mod server;

pub use client::GrpcTransport;
pub use codec::BytesCodec;
pub use server::GrpcServer;

use tonic::Code;

use crate::protocol::codes;

/// Lower-case name of a gRPC status code, matching the daemon's codes
pub fn code_name(code: Code) -> &'static str {
    match code {
        Code::Ok => "ok",
        Code::Cancelled => "cancelled",
        Code::InvalidArgument => codes::INVALID_ARGUMENT,
        Code::DeadlineExceeded => "deadline_exceeded",
        Code::NotFound => "not_found",
        Code::AlreadyExists => "already_exists",
        Code::PermissionDenied => "permission_denied",
        Code::ResourceExhausted => "resource_exhausted",
        Code::FailedPrecondition => "failed_precondition",
        Code::Aborted => "aborted",
        Code::OutOfRange => "out_of_range",
        Code::Unimplemented => codes::UNIMPLEMENTED,
        Code::Internal => codes::INTERNAL,
        Code::Unavailable => "unavailable",
        Code::DataLoss => "data_loss",
        Code::Unauthenticated => "unauthenticated",
        _ => "unknown",
    }
}
