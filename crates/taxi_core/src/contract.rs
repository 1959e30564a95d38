//! Wire contract between the overlay and the host process.
//!
//! Field names follow the host's camelCase JSON. Request payloads that commit a
//! ride can only be built from a [`RideProposal`](crate::selection::RideProposal),
//! so their fields are crate-private.

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

pub const PREVIEW_ENDPOINT: &str = "preview";
pub const REQUEST_TAXI_ENDPOINT: &str = "requestTaxi";
pub const CONFIRM_RIDE_ENDPOINT: &str = "confirmRide";
pub const CLOSE_ENDPOINT: &str = "close";
pub const PLAY_SOUND_ENDPOINT: &str = "playSound";

pub const DEFAULT_RIDE_MODE: &str = "watch";
/// Shown when the host declines without giving a reason.
pub const DEFAULT_DECLINE_REASON: &str = "request declined";

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("response is missing `{0}`")]
    MissingField(&'static str),
    #[error("`{field}` must be a non-negative number, got {value}")]
    InvalidAmount { field: &'static str, value: f64 },
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Bank,
    Cash,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bank => "bank",
            Self::Cash => "cash",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Bank => "Bank",
            Self::Cash => "Cash",
        }
    }
}

/// Transport mode tag forwarded verbatim to the host (e.g. `"watch"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RideMode(String);

impl RideMode {
    pub fn new(mode: impl Into<String>) -> Self {
        Self(mode.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RideMode {
    fn default() -> Self {
        Self(DEFAULT_RIDE_MODE.to_string())
    }
}

impl fmt::Display for RideMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Destination part of a preview or ride payload: `{quickIndex}` or `{useWaypoint: true}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    quick_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    use_waypoint: Option<bool>,
}

impl DestinationRef {
    /// `wire_index` is 1-based.
    pub fn quick(wire_index: u32) -> Self {
        Self {
            quick_index: Some(wire_index),
            use_waypoint: None,
        }
    }

    pub fn waypoint() -> Self {
        Self {
            quick_index: None,
            use_waypoint: Some(true),
        }
    }

    pub fn quick_index(&self) -> Option<u32> {
        self.quick_index
    }

    pub fn is_waypoint(&self) -> bool {
        self.use_waypoint == Some(true)
    }
}

pub type PreviewRequest = DestinationRef;

/// `requestTaxi` payload: a proposal plus the transport mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RideRequest {
    pub(crate) mode: RideMode,
    #[serde(flatten)]
    pub(crate) destination: DestinationRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) preset: Option<String>,
    #[serde(serialize_with = "serialize_amount")]
    pub(crate) fare: f64,
    pub(crate) eta: u64,
}

const MAX_EXACT_INTEGER: f64 = 9_007_199_254_740_992.0;

/// Whole amounts go out as JSON integers (`27`, not `27.0`).
fn serialize_amount<S: Serializer>(amount: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if amount.fract() == 0.0 && amount.abs() <= MAX_EXACT_INTEGER {
        serializer.serialize_i64(*amount as i64)
    } else {
        serializer.serialize_f64(*amount)
    }
}

impl RideRequest {
    pub fn mode(&self) -> &RideMode {
        &self.mode
    }

    pub fn destination(&self) -> DestinationRef {
        self.destination
    }

    pub fn preset(&self) -> Option<&str> {
        self.preset.as_deref()
    }

    pub fn fare(&self) -> f64 {
        self.fare
    }

    pub fn eta_secs(&self) -> u64 {
        self.eta
    }
}

/// `confirmRide` payload: a proposal, the transport mode and the payment method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingRideRequest {
    pub(crate) payment: PaymentMethod,
    #[serde(flatten)]
    pub(crate) ride: RideRequest,
}

impl PendingRideRequest {
    pub fn payment(&self) -> PaymentMethod {
        self.payment
    }

    pub fn ride(&self) -> &RideRequest {
        &self.ride
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    PlaySound,
}

impl Notification {
    pub fn endpoint(self) -> &'static str {
        match self {
            Self::PlaySound => PLAY_SOUND_ENDPOINT,
        }
    }
}

/// Business-level answer from the host. Transport failures are not verdicts.
#[derive(Debug, Clone, PartialEq)]
pub enum HostVerdict<T> {
    Accepted(T),
    Declined(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewQuote {
    pub fare: f64,
    pub eta_secs: u64,
    pub preset: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fare: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
}

impl PreviewResponse {
    /// Split a preview answer into accepted quote or declined reason.
    ///
    /// A successful answer without a usable fare or ETA is malformed.
    pub fn into_verdict(self) -> Result<HostVerdict<PreviewQuote>, ContractError> {
        if !self.success {
            return Ok(HostVerdict::Declined(decline_reason(self.reason)));
        }
        let fare = non_negative("fare", self.fare.ok_or(ContractError::MissingField("fare"))?)?;
        let eta = non_negative("eta", self.eta.ok_or(ContractError::MissingField("eta"))?)?;
        Ok(HostVerdict::Accepted(PreviewQuote {
            fare,
            eta_secs: eta as u64,
            preset: self.preset,
        }))
    }
}

/// Answer to `requestTaxi` and `confirmRide`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostReply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl HostReply {
    pub fn into_verdict(self) -> HostVerdict<()> {
        if self.success {
            HostVerdict::Accepted(())
        } else {
            HostVerdict::Declined(decline_reason(self.reason))
        }
    }
}

fn decline_reason(reason: Option<String>) -> String {
    reason
        .filter(|reason| !reason.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DECLINE_REASON.to_string())
}

fn non_negative(field: &'static str, value: f64) -> Result<f64, ContractError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ContractError::InvalidAmount { field, value })
    }
}

/// Per-open overlay configuration delivered with `openUI`.
///
/// The host sends its whole resource config; only the keys below are read.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    #[serde(rename = "PresetLocations", default)]
    pub preset_locations: Option<Vec<PresetLocation>>,
    #[serde(rename = "SoundEffects", default)]
    pub sound_effects: Option<bool>,
}

impl OverlayConfig {
    pub fn sound_effects_enabled(&self) -> bool {
        self.sound_effects.unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PresetLocation {
    #[serde(default)]
    pub name: String,
}

/// Ride summary the host asks the player to confirm.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfirmPreview {
    pub mode: Option<String>,
    pub preset: Option<String>,
    pub use_waypoint: Option<bool>,
    pub fare: Option<f64>,
    pub eta: Option<f64>,
}

impl ConfirmPreview {
    pub fn title(&self) -> &str {
        match self.preset.as_deref().filter(|preset| !preset.is_empty()) {
            Some(preset) => preset,
            None if self.use_waypoint == Some(true) => "Waypoint",
            None => "Destination",
        }
    }
}

/// Unsolicited messages from the host, discriminated by `action`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum PushEvent {
    #[serde(rename = "openUI")]
    OpenUi {
        #[serde(default)]
        config: Option<OverlayConfig>,
    },
    #[serde(rename = "hideUI")]
    HideUi,
    #[serde(rename = "updateHUD")]
    UpdateHud {
        #[serde(default)]
        eta: Option<f64>,
        #[serde(default)]
        distance: Option<f64>,
        #[serde(default)]
        fare: Option<f64>,
    },
    #[serde(rename = "clearHUD")]
    ClearHud,
    #[serde(rename = "farePopup")]
    FarePopup {
        #[serde(default)]
        fare: Option<f64>,
    },
    #[serde(rename = "openConfirm")]
    OpenConfirm {
        #[serde(default)]
        data: Option<ConfirmPreview>,
    },
}

impl PushEvent {
    pub fn from_json(raw: &str) -> Result<Self, ContractError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn action(&self) -> &'static str {
        match self {
            Self::OpenUi { .. } => "openUI",
            Self::HideUi => "hideUI",
            Self::UpdateHud { .. } => "updateHUD",
            Self::ClearHud => "clearHUD",
            Self::FarePopup { .. } => "farePopup",
            Self::OpenConfirm { .. } => "openConfirm",
        }
    }
}
