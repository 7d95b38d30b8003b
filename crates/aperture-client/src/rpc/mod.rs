//! Decision channel: the remote check call.
//!
//! `FlowControlService` is the seam between the client and the agent. The gRPC
//! implementation talks to a real agent; tests substitute an in-process fake.

pub mod grpc;

use std::sync::Arc;

use async_trait::async_trait;
use tonic::{Request, Response, Status};

use aperture_core::protocol::{CheckRequest, CheckResponse};

pub use grpc::{lazy_channel, GrpcFlowControl};

/// Remote flow control service (one unary `Check` call).
#[async_trait]
pub trait FlowControlService: Send + Sync {
    async fn check(&self, request: Request<CheckRequest>) -> Result<Response<CheckResponse>, Status>;
}

#[async_trait]
impl<T: FlowControlService + ?Sized> FlowControlService for Arc<T> {
    async fn check(&self, request: Request<CheckRequest>) -> Result<Response<CheckResponse>, Status> {
        (**self).check(request).await
    }
}
