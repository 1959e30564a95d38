use std::future::Future;

use taxi_core::contract::{
    ContractError, HostReply, Notification, PendingRideRequest, PreviewRequest, PreviewResponse,
    RideRequest,
};
use thiserror::Error;

/// Transport-level failure talking to the host. Business refusals
/// (`success: false`) are not errors; they arrive as regular responses.
#[derive(Debug, Error)]
pub enum HostChannelError {
    #[error("host request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("host answered {endpoint} with status {status}")]
    Status { endpoint: &'static str, status: u16 },
    #[error("malformed host response: {0}")]
    Malformed(#[from] ContractError),
    #[error("host channel unavailable: {0}")]
    Unavailable(String),
}

/// Request/response boundary to the host process.
///
/// Calls return owned futures so the controller can spawn them and keep
/// handling input while they are outstanding. Implementations should do any
/// bookkeeping that must happen at call time before returning the future.
pub trait HostChannel {
    fn preview(
        &self,
        request: PreviewRequest,
    ) -> impl Future<Output = Result<PreviewResponse, HostChannelError>> + Send + 'static;

    fn request_taxi(
        &self,
        request: RideRequest,
    ) -> impl Future<Output = Result<HostReply, HostChannelError>> + Send + 'static;

    fn confirm_ride(
        &self,
        request: PendingRideRequest,
    ) -> impl Future<Output = Result<HostReply, HostChannelError>> + Send + 'static;

    fn close(&self) -> impl Future<Output = Result<(), HostChannelError>> + Send + 'static;

    /// Fire-and-forget side effect. Callers never await this on the main flow.
    fn notify(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), HostChannelError>> + Send + 'static;
}
