//! Render instructions for the overlay shell.
//!
//! State changes produce [`ViewUpdate`]s; the shell applies them. Rendering
//! never feeds back into selection state.

use serde::Serialize;

use crate::contract::{ConfirmPreview, PaymentMethod};
use crate::format::{
    confirm_label, eta_label, format_amount, format_fare, format_time, whole_seconds,
    ETA_PLACEHOLDER,
};
use crate::selection::{RideProposal, RideSelection};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ViewUpdate {
    OverlayVisible { visible: bool },
    QuickList { labels: Vec<String> },
    QuickHighlight { index: Option<usize> },
    Proposal { fare: String, eta: String },
    /// Inline status line; an empty message clears it.
    Info { message: String },
    RequestEnabled { enabled: bool },
    Payment {
        method: Option<PaymentMethod>,
        confirm_label: Option<String>,
        confirm_enabled: bool,
    },
    CloseEnabled { enabled: bool },
    Hud { line: String, progress: f64 },
    HudHidden,
    FarePopup { amount: String },
    FarePopupHidden,
    ConfirmModal { title: String, fare: String, eta: String },
    ConfirmModalHidden,
}

impl ViewUpdate {
    pub fn info(message: impl Into<String>) -> Self {
        Self::Info {
            message: message.into(),
        }
    }

    pub fn clear_info() -> Self {
        Self::info("")
    }
}

/// Fare and ETA display; placeholders when nothing is proposed.
pub fn proposal_update(proposal: Option<&RideProposal>) -> ViewUpdate {
    match proposal {
        Some(proposal) => ViewUpdate::Proposal {
            fare: format_fare(proposal.fare()),
            eta: eta_label(i64::try_from(proposal.eta_secs()).unwrap_or(i64::MAX)),
        },
        None => ViewUpdate::Proposal {
            fare: format_fare(0.0),
            eta: ETA_PLACEHOLDER.to_string(),
        },
    }
}

pub fn payment_update(method: Option<PaymentMethod>, confirm_enabled: bool) -> ViewUpdate {
    ViewUpdate::Payment {
        method,
        confirm_label: method.map(confirm_label),
        confirm_enabled,
    }
}

/// Control state derived from the selection: request, payment/confirm, close.
pub fn control_updates(selection: &RideSelection) -> Vec<ViewUpdate> {
    let affordances = selection.affordances();
    vec![
        ViewUpdate::RequestEnabled {
            enabled: affordances.request_enabled,
        },
        payment_update(selection.payment(), affordances.confirm_enabled),
        ViewUpdate::CloseEnabled {
            enabled: affordances.close_enabled,
        },
    ]
}

pub fn confirm_modal(preview: &ConfirmPreview) -> ViewUpdate {
    let fare = match preview.fare {
        Some(fare) => format!("${}", format_amount(fare)),
        None => "$--".to_string(),
    };
    ViewUpdate::ConfirmModal {
        title: preview.title().to_string(),
        fare,
        eta: format_time(whole_seconds(preview.eta.unwrap_or(0.0))),
    }
}
