use std::future::Future;

use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use taxi_core::contract::{
    ContractError, HostReply, Notification, PendingRideRequest, PreviewRequest, PreviewResponse,
    RideRequest, CLOSE_ENDPOINT, CONFIRM_RIDE_ENDPOINT, PREVIEW_ENDPOINT, REQUEST_TAXI_ENDPOINT,
};

use super::host::{HostChannel, HostChannelError};
use crate::settings::OverlaySettings;

const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Host channel that POSTs JSON to `<base>/<endpoint>`.
#[derive(Debug, Clone)]
pub struct HttpHostChannel {
    client: Client,
    base_url: String,
}

impl HttpHostChannel {
    pub fn new(settings: &OverlaySettings) -> Result<Self, HostChannelError> {
        let client = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: settings.base_url(),
        })
    }

    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    fn post_json<B, R>(
        &self,
        endpoint: &'static str,
        body: &B,
    ) -> impl Future<Output = Result<R, HostChannelError>> + Send + 'static
    where
        B: Serialize,
        R: DeserializeOwned + Send + 'static,
    {
        let encoded = serde_json::to_vec(body);
        let builder = self
            .client
            .post(self.endpoint_url(endpoint))
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE);
        async move {
            let encoded = encoded.map_err(ContractError::from)?;
            let response = builder.body(encoded).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(HostChannelError::Status {
                    endpoint,
                    status: status.as_u16(),
                });
            }
            let bytes = response.bytes().await?;
            decode_body(&bytes)
        }
    }

    fn post_empty(
        &self,
        endpoint: &'static str,
    ) -> impl Future<Output = Result<(), HostChannelError>> + Send + 'static {
        let builder = self.client.post(self.endpoint_url(endpoint));
        async move {
            let response = builder.send().await?;
            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(HostChannelError::Status {
                    endpoint,
                    status: status.as_u16(),
                })
            }
        }
    }
}

fn decode_body<R: DeserializeOwned>(bytes: &[u8]) -> Result<R, HostChannelError> {
    serde_json::from_slice(bytes)
        .map_err(ContractError::from)
        .map_err(HostChannelError::from)
}

impl HostChannel for HttpHostChannel {
    fn preview(
        &self,
        request: PreviewRequest,
    ) -> impl Future<Output = Result<PreviewResponse, HostChannelError>> + Send + 'static {
        self.post_json(PREVIEW_ENDPOINT, &request)
    }

    fn request_taxi(
        &self,
        request: RideRequest,
    ) -> impl Future<Output = Result<HostReply, HostChannelError>> + Send + 'static {
        self.post_json(REQUEST_TAXI_ENDPOINT, &request)
    }

    fn confirm_ride(
        &self,
        request: PendingRideRequest,
    ) -> impl Future<Output = Result<HostReply, HostChannelError>> + Send + 'static {
        self.post_json(CONFIRM_RIDE_ENDPOINT, &request)
    }

    fn close(&self) -> impl Future<Output = Result<(), HostChannelError>> + Send + 'static {
        self.post_empty(CLOSE_ENDPOINT)
    }

    fn notify(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), HostChannelError>> + Send + 'static {
        self.post_empty(notification.endpoint())
    }
}
