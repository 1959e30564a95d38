#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use taxi_core::contract::{
    ContractError, HostReply, Notification, PendingRideRequest, PreviewRequest, PreviewResponse,
    RideRequest, CLOSE_ENDPOINT, CONFIRM_RIDE_ENDPOINT, PREVIEW_ENDPOINT, REQUEST_TAXI_ENDPOINT,
};
use taxi_overlay::adapters::host::{HostChannel, HostChannelError};
use tokio::sync::oneshot;

type Reply = Result<Value, HostChannelError>;

#[derive(Debug, Clone, PartialEq)]
pub struct HostCall {
    pub id: usize,
    pub endpoint: &'static str,
    pub body: Value,
}

#[derive(Default)]
struct HostState {
    calls: Vec<HostCall>,
    pending: HashMap<usize, oneshot::Sender<Reply>>,
    auto_replies: HashMap<&'static str, Value>,
    failing_side_effects: bool,
    side_effect_delay: Option<Duration>,
    delivered_side_effects: Vec<&'static str>,
}

/// Host double that records every call when it is made and holds each
/// answer until the test releases it.
#[derive(Clone, Default)]
pub struct ScriptedHost {
    state: Arc<Mutex<HostState>>,
}

impl ScriptedHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, HostState> {
        self.state.lock().expect("host state lock")
    }

    /// Answer every later call to `endpoint` immediately with `body`.
    pub fn auto_reply(&self, endpoint: &'static str, body: Value) {
        self.state().auto_replies.insert(endpoint, body);
    }

    pub fn fail_side_effects(&self) {
        self.state().failing_side_effects = true;
    }

    /// Side effects complete only after `delay` has passed.
    pub fn delay_side_effects(&self, delay: Duration) {
        self.state().side_effect_delay = Some(delay);
    }

    /// Side effects that ran to completion, as opposed to merely being called.
    pub fn delivered(&self, endpoint: &str) -> usize {
        self.state()
            .delivered_side_effects
            .iter()
            .filter(|delivered| **delivered == endpoint)
            .count()
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.state().calls.clone()
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<HostCall> {
        self.state()
            .calls
            .iter()
            .filter(|call| call.endpoint == endpoint)
            .cloned()
            .collect()
    }

    pub fn request_calls(&self) -> Vec<HostCall> {
        self.state()
            .calls
            .iter()
            .filter(|call| {
                [PREVIEW_ENDPOINT, REQUEST_TAXI_ENDPOINT, CONFIRM_RIDE_ENDPOINT]
                    .contains(&call.endpoint)
            })
            .cloned()
            .collect()
    }

    /// Ids of unanswered calls to `endpoint`, oldest first.
    pub fn pending_ids(&self, endpoint: &str) -> Vec<usize> {
        let state = self.state();
        state
            .calls
            .iter()
            .filter(|call| call.endpoint == endpoint && state.pending.contains_key(&call.id))
            .map(|call| call.id)
            .collect()
    }

    pub fn reply(&self, id: usize, body: Value) {
        self.release(id, Ok(body));
    }

    pub fn fail(&self, id: usize) {
        self.release(
            id,
            Err(HostChannelError::Unavailable("connection refused".to_string())),
        );
    }

    fn release(&self, id: usize, reply: Reply) {
        let sender = self
            .state()
            .pending
            .remove(&id)
            .unwrap_or_else(|| panic!("call {id} is not pending"));
        let _ = sender.send(reply);
    }

    fn record(&self, endpoint: &'static str, body: Value) -> usize {
        let mut state = self.state();
        let id = state.calls.len();
        state.calls.push(HostCall { id, endpoint, body });
        id
    }

    fn request<B, R>(
        &self,
        endpoint: &'static str,
        body: &B,
    ) -> impl Future<Output = Result<R, HostChannelError>> + Send + 'static
    where
        B: Serialize,
        R: DeserializeOwned + Send + 'static,
    {
        let body = serde_json::to_value(body).expect("request should encode");
        let id = self.record(endpoint, body);
        let (sender, receiver) = oneshot::channel();
        {
            let mut state = self.state();
            match state.auto_replies.get(endpoint).cloned() {
                Some(reply) => {
                    let _ = sender.send(Ok(reply));
                }
                None => {
                    state.pending.insert(id, sender);
                }
            }
        }
        async move {
            let reply = receiver
                .await
                .map_err(|_| HostChannelError::Unavailable("host went away".to_string()))??;
            serde_json::from_value(reply)
                .map_err(|error| HostChannelError::Malformed(ContractError::from(error)))
        }
    }

    fn side_effect(
        &self,
        endpoint: &'static str,
    ) -> impl Future<Output = Result<(), HostChannelError>> + Send + 'static {
        self.record(endpoint, Value::Null);
        let (failing, delay) = {
            let state = self.state();
            (state.failing_side_effects, state.side_effect_delay)
        };
        let state = Arc::clone(&self.state);
        async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if failing {
                return Err(HostChannelError::Unavailable(format!("{endpoint} rejected")));
            }
            state
                .lock()
                .expect("host state lock")
                .delivered_side_effects
                .push(endpoint);
            Ok(())
        }
    }
}

impl HostChannel for ScriptedHost {
    fn preview(
        &self,
        request: PreviewRequest,
    ) -> impl Future<Output = Result<PreviewResponse, HostChannelError>> + Send + 'static {
        self.request(PREVIEW_ENDPOINT, &request)
    }

    fn request_taxi(
        &self,
        request: RideRequest,
    ) -> impl Future<Output = Result<HostReply, HostChannelError>> + Send + 'static {
        self.request(REQUEST_TAXI_ENDPOINT, &request)
    }

    fn confirm_ride(
        &self,
        request: PendingRideRequest,
    ) -> impl Future<Output = Result<HostReply, HostChannelError>> + Send + 'static {
        self.request(CONFIRM_RIDE_ENDPOINT, &request)
    }

    fn close(&self) -> impl Future<Output = Result<(), HostChannelError>> + Send + 'static {
        self.side_effect(CLOSE_ENDPOINT)
    }

    fn notify(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), HostChannelError>> + Send + 'static {
        self.side_effect(notification.endpoint())
    }
}
