//! Client-side settings for the overlay process.
//!
//! These are fixed for the life of the process. Per-open configuration
//! (preset destinations, sound toggle) comes from the host with `openUI`.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use taxi_core::contract::{PaymentMethod, RideMode};
use taxi_core::hud::FARE_POPUP_DURATION;
use thiserror::Error;

pub const DEFAULT_RESOURCE_NAME: &str = "taxi";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 3_000;
const MIN_REQUEST_TIMEOUT_MS: u64 = 100;
const MAX_REQUEST_TIMEOUT_MS: u64 = 60_000;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    InvalidFormat(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OverlaySettings {
    /// Host resource the overlay belongs to; endpoints resolve to `https://<resource_name>/...`.
    pub resource_name: String,
    /// Replaces the resource-derived base URL when set.
    pub base_url: Option<String>,
    pub request_timeout_ms: u64,
    pub default_mode: RideMode,
    /// Payment preselected whenever the overlay opens.
    pub default_payment: Option<PaymentMethod>,
    pub popup_duration_ms: u64,
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            resource_name: DEFAULT_RESOURCE_NAME.to_string(),
            base_url: None,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            default_mode: RideMode::default(),
            default_payment: None,
            popup_duration_ms: FARE_POPUP_DURATION.as_millis() as u64,
        }
    }
}

impl OverlaySettings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let raw = fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&raw)?;
        Ok(settings.normalized())
    }

    /// Replace blank or out-of-range values with usable ones.
    pub fn normalized(mut self) -> Self {
        let resource_name = self.resource_name.trim();
        self.resource_name = if resource_name.is_empty() {
            DEFAULT_RESOURCE_NAME.to_string()
        } else {
            resource_name.to_string()
        };
        self.base_url = self
            .base_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());
        self.request_timeout_ms = self
            .request_timeout_ms
            .clamp(MIN_REQUEST_TIMEOUT_MS, MAX_REQUEST_TIMEOUT_MS);
        if self.default_mode.as_str().trim().is_empty() {
            self.default_mode = RideMode::default();
        }
        self
    }

    pub fn base_url(&self) -> String {
        match self.base_url.as_deref() {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}", self.resource_name),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn popup_duration(&self) -> Duration {
        Duration::from_millis(self.popup_duration_ms)
    }
}
