use crate::contract::{
    DestinationRef, PaymentMethod, PendingRideRequest, PreviewQuote, RideMode, RideRequest,
};

/// Where a previewed ride goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideOrigin {
    /// 0-based position in the quick-destination registry.
    QuickIndex(usize),
    Waypoint,
}

impl RideOrigin {
    pub fn destination_ref(self) -> DestinationRef {
        match self {
            Self::QuickIndex(index) => {
                DestinationRef::quick(u32::try_from(index + 1).unwrap_or(u32::MAX))
            }
            Self::Waypoint => DestinationRef::waypoint(),
        }
    }
}

/// Fare and ETA the host quoted for one destination. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct RideProposal {
    origin: RideOrigin,
    fare: f64,
    eta_secs: u64,
    preset_name: Option<String>,
}

impl RideProposal {
    pub(super) fn from_quote(origin: RideOrigin, quote: PreviewQuote) -> Self {
        let preset_name = match origin {
            RideOrigin::QuickIndex(_) => quote.preset,
            RideOrigin::Waypoint => None,
        };
        Self {
            origin,
            fare: quote.fare,
            eta_secs: quote.eta_secs,
            preset_name,
        }
    }

    pub fn origin(&self) -> RideOrigin {
        self.origin
    }

    pub fn fare(&self) -> f64 {
        self.fare
    }

    pub fn eta_secs(&self) -> u64 {
        self.eta_secs
    }

    pub fn preset_name(&self) -> Option<&str> {
        self.preset_name.as_deref()
    }

    pub(super) fn ride_request(&self, mode: RideMode) -> RideRequest {
        RideRequest {
            mode,
            destination: self.origin.destination_ref(),
            preset: self.preset_name.clone(),
            fare: self.fare,
            eta: self.eta_secs,
        }
    }

    pub(super) fn pending_request(
        &self,
        mode: RideMode,
        payment: PaymentMethod,
    ) -> PendingRideRequest {
        PendingRideRequest {
            payment,
            ride: self.ride_request(mode),
        }
    }
}
