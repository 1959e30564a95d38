//! Boundary to the rendering shell: user actions in, view updates out.

use std::io::Write;

use serde::{Deserialize, Serialize};
use taxi_core::contract::{PaymentMethod, RideMode};
use taxi_core::view::ViewUpdate;

/// Input the shell forwards from the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "user", rename_all = "camelCase")]
pub enum UserAction {
    /// 0-based position in the quick list.
    PreviewQuick { index: usize },
    PreviewWaypoint,
    SetPayment { method: PaymentMethod },
    SetMode { mode: RideMode },
    RequestRide,
    Confirm,
    CancelConfirm,
    Close,
    ShowQuickList,
}

/// Render target. Implementations assume every element they draw exists.
pub trait OverlayView {
    fn apply(&mut self, update: ViewUpdate);
}

/// Keeps every update in order.
#[derive(Debug, Default)]
pub struct RecordingView {
    updates: Vec<ViewUpdate>,
}

impl RecordingView {
    pub fn updates(&self) -> &[ViewUpdate] {
        &self.updates
    }

    pub fn take(&mut self) -> Vec<ViewUpdate> {
        std::mem::take(&mut self.updates)
    }

    pub fn last_info(&self) -> Option<&str> {
        self.updates.iter().rev().find_map(|update| match update {
            ViewUpdate::Info { message } => Some(message.as_str()),
            _ => None,
        })
    }
}

impl OverlayView for RecordingView {
    fn apply(&mut self, update: ViewUpdate) {
        self.updates.push(update);
    }
}

/// Writes each update as one JSON line, for shells living in another process.
#[derive(Debug)]
pub struct JsonLinesView<W: Write> {
    writer: W,
}

impl<W: Write> JsonLinesView<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> OverlayView for JsonLinesView<W> {
    fn apply(&mut self, update: ViewUpdate) {
        let written = serde_json::to_string(&update)
            .map_err(std::io::Error::from)
            .and_then(|line| writeln!(self.writer, "{line}"))
            .and_then(|()| self.writer.flush());
        if let Err(error) = written {
            tracing::warn!(component = "shell", event = "render_failed", %error);
        }
    }
}
