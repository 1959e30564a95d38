//! In-ride heads-up display and fare popup.
//!
//! The presenter never looks at selection state: HUD pushes keep arriving
//! while the selection overlay is closed.

use std::time::{Duration, Instant};

use crate::format::{format_fare, hud_line, hud_progress, whole_seconds};
use crate::view::ViewUpdate;

pub const FARE_POPUP_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HudSnapshot {
    pub eta_secs: i64,
    pub distance_m: f64,
    pub fare: f64,
}

impl HudSnapshot {
    /// Missing readings count as zero.
    pub fn from_readings(eta: Option<f64>, distance: Option<f64>, fare: Option<f64>) -> Self {
        Self {
            eta_secs: whole_seconds(eta.unwrap_or(0.0)),
            distance_m: distance.unwrap_or(0.0),
            fare: fare.unwrap_or(0.0),
        }
    }

    pub fn progress(&self) -> f64 {
        hud_progress(self.distance_m)
    }

    pub fn line(&self) -> String {
        hud_line(self.eta_secs, self.distance_m, self.fare)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct FarePopup {
    fare: f64,
    hide_at: Instant,
}

#[derive(Debug, Clone)]
pub struct HudPresenter {
    snapshot: Option<HudSnapshot>,
    popup: Option<FarePopup>,
    popup_duration: Duration,
}

impl Default for HudPresenter {
    fn default() -> Self {
        Self::new(FARE_POPUP_DURATION)
    }
}

impl HudPresenter {
    pub fn new(popup_duration: Duration) -> Self {
        Self {
            snapshot: None,
            popup: None,
            popup_duration,
        }
    }

    /// Current readings, `None` while the HUD is hidden.
    pub fn snapshot(&self) -> Option<&HudSnapshot> {
        self.snapshot.as_ref()
    }

    /// Replace the whole snapshot.
    pub fn update(&mut self, snapshot: HudSnapshot) -> ViewUpdate {
        self.snapshot = Some(snapshot);
        ViewUpdate::Hud {
            line: snapshot.line(),
            progress: snapshot.progress(),
        }
    }

    pub fn clear(&mut self) -> ViewUpdate {
        self.snapshot = None;
        ViewUpdate::HudHidden
    }

    /// Show the popup and (re)start its hide timer. An earlier timer is
    /// replaced, never stacked.
    pub fn show_popup(&mut self, fare: Option<f64>, now: Instant) -> ViewUpdate {
        let fare = fare.unwrap_or(0.0);
        self.popup = Some(FarePopup {
            fare,
            hide_at: now + self.popup_duration,
        });
        ViewUpdate::FarePopup {
            amount: format_fare(fare),
        }
    }

    pub fn popup_fare(&self) -> Option<f64> {
        self.popup.map(|popup| popup.fare)
    }

    pub fn popup_deadline(&self) -> Option<Instant> {
        self.popup.map(|popup| popup.hide_at)
    }

    /// Hide the popup once its deadline has passed.
    pub fn expire_popup(&mut self, now: Instant) -> Option<ViewUpdate> {
        let popup = self.popup?;
        if now < popup.hide_at {
            return None;
        }
        self.popup = None;
        Some(ViewUpdate::FarePopupHidden)
    }
}
