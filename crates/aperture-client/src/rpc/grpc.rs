use async_trait::async_trait;
use tonic::codec::ProstCodec;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, Endpoint};
use tonic::{Request, Response, Status};

use aperture_core::attributes::LIBRARY_NAME;
use aperture_core::error::{ApertureError, Result};
use aperture_core::protocol::{CheckRequest, CheckResponse, CHECK_PATH};

use super::FlowControlService;

/// gRPC client for `aperture.flowcontrol.v1.FlowControlService`.
///
/// Holds an already-established channel; connection management, TLS, and
/// reconnect backoff stay with whoever built the channel.
#[derive(Debug, Clone)]
pub struct GrpcFlowControl {
    channel: Channel,
}

impl GrpcFlowControl {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl FlowControlService for GrpcFlowControl {
    async fn check(&self, request: Request<CheckRequest>) -> std::result::Result<Response<CheckResponse>, Status> {
        let mut grpc = tonic::client::Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| Status::unavailable(format!("flow control service not ready: {e}")))?;

        let codec: ProstCodec<CheckRequest, CheckResponse> = ProstCodec::default();
        grpc.unary(request, PathAndQuery::from_static(CHECK_PATH), codec).await
    }
}

/// Build a lazily connecting channel to `endpoint`. Must run inside a tokio runtime.
pub fn lazy_channel(endpoint: &str) -> Result<Channel> {
    let ep = Endpoint::from_shared(endpoint.to_string())
        .map_err(|e| ApertureError::InvalidOptions(format!("invalid endpoint {endpoint}: {e}")))?
        .user_agent(LIBRARY_NAME)
        .map_err(|e| ApertureError::InvalidOptions(format!("invalid user agent: {e}")))?;
    Ok(ep.connect_lazy())
}
