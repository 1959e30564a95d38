//! Inbound push events from the host.
//!
//! Whatever transport receives host messages holds a [`PushSender`]; the
//! controller reads the matching [`PushInbox`]. The queue is unbounded so the
//! host side never waits on the overlay, and events come out in arrival order.

use taxi_core::contract::{ContractError, PushEvent};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Error)]
pub enum PushError {
    #[error("undecodable push event: {0}")]
    Decode(#[from] ContractError),
    #[error("push inbox is closed")]
    Closed,
}

pub fn push_channel() -> (PushSender, PushInbox) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (PushSender { sender }, PushInbox { receiver })
}

#[derive(Debug, Clone)]
pub struct PushSender {
    sender: mpsc::UnboundedSender<PushEvent>,
}

impl PushSender {
    pub fn deliver(&self, event: PushEvent) -> Result<(), PushError> {
        self.sender.send(event).map_err(|_| PushError::Closed)
    }

    /// Decode one raw host message and queue it.
    pub fn deliver_json(&self, raw: &str) -> Result<(), PushError> {
        self.deliver(PushEvent::from_json(raw)?)
    }
}

#[derive(Debug)]
pub struct PushInbox {
    receiver: mpsc::UnboundedReceiver<PushEvent>,
}

impl PushInbox {
    /// Next event, or `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<PushEvent> {
        self.receiver.recv().await
    }
}
