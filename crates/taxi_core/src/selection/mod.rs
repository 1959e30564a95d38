//! Ride selection state machine.
//!
//! One [`RideSelection`] exists per open overlay session. It is the only
//! writer of the previewed proposal and the payment choice, and the only place
//! that can build a ride request for the host. Network round-trips are split
//! into an issuing call that returns a ticket and a completion call that takes
//! the host's answer, so the caller owns all IO.
//!
//! Every outbound request carries a [`RequestId`]. Only the most recently
//! issued preview may update the proposal; answers to superseded previews are
//! reported as stale and change nothing.

mod proposal;

#[cfg(test)]
mod tests;

use std::fmt;

use thiserror::Error;

use crate::contract::{
    HostVerdict, PaymentMethod, PendingRideRequest, PreviewQuote, PreviewRequest, RideMode,
    RideRequest,
};
use crate::destinations::QuickDestinations;

pub use proposal::{RideOrigin, RideProposal};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s{}", self.0)
    }
}

/// Correlates a host answer with the request that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId {
    session: SessionId,
    seq: u64,
}

impl RequestId {
    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-r{}", self.session, self.seq)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPhase {
    Idle,
    Previewing,
    Proposed,
    /// A confirm or direct ride request is in flight.
    ConfirmPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionPart {
    Proposal,
    Payment,
}

impl SelectionPart {
    pub fn prompt(self) -> &'static str {
        match self {
            Self::Proposal => "Please choose a destination first.",
            Self::Payment => "Please select a payment method first.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("{}", .0.prompt())]
    MissingSelection(SelectionPart),
    #[error("unknown quick destination {index} ({available} available)")]
    UnknownDestination { index: usize, available: usize },
    #[error("Please wait for the current ride request to finish.")]
    CommitInFlight,
}

/// How a host round-trip ended, as far as selection state is concerned.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution<T> {
    Accepted(T),
    Declined(String),
    /// Transport failure or malformed answer.
    Unreachable,
}

impl<T> From<HostVerdict<T>> for Resolution<T> {
    fn from(verdict: HostVerdict<T>) -> Self {
        match verdict {
            HostVerdict::Accepted(value) => Self::Accepted(value),
            HostVerdict::Declined(reason) => Self::Declined(reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PreviewTicket {
    pub id: RequestId,
    pub request: PreviewRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    /// `confirmRide`, with a payment method.
    Confirm,
    /// `requestTaxi`, the one-step dispatch.
    Direct,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitRequest {
    Confirm(PendingRideRequest),
    Direct(RideRequest),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CommitTicket {
    pub id: RequestId,
    pub request: CommitRequest,
}

impl CommitTicket {
    pub fn kind(&self) -> CommitKind {
        match self.request {
            CommitRequest::Confirm(_) => CommitKind::Confirm,
            CommitRequest::Direct(_) => CommitKind::Direct,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreviewOutcome {
    /// Answer to a superseded preview; nothing changed.
    Stale,
    Proposed,
    Declined(String),
    Unreachable,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CommitOutcome {
    Stale,
    Committed(CommitKind),
    Declined { kind: CommitKind, reason: String },
    Unreachable(CommitKind),
}

/// Which controls the shell should enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordances {
    pub request_enabled: bool,
    pub confirm_enabled: bool,
    pub close_enabled: bool,
}

#[derive(Debug, Clone)]
pub struct RideSelection {
    session: SessionId,
    destinations: QuickDestinations,
    proposal: Option<RideProposal>,
    payment: Option<PaymentMethod>,
    latest_preview: Option<(RequestId, RideOrigin)>,
    commit: Option<(RequestId, CommitKind)>,
    next_seq: u64,
}

impl RideSelection {
    pub fn new(
        session: SessionId,
        destinations: QuickDestinations,
        payment: Option<PaymentMethod>,
    ) -> Self {
        Self {
            session,
            destinations,
            proposal: None,
            payment,
            latest_preview: None,
            commit: None,
            next_seq: 0,
        }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn destinations(&self) -> &QuickDestinations {
        &self.destinations
    }

    pub fn proposal(&self) -> Option<&RideProposal> {
        self.proposal.as_ref()
    }

    pub fn payment(&self) -> Option<PaymentMethod> {
        self.payment
    }

    pub fn phase(&self) -> SelectionPhase {
        if self.commit.is_some() {
            SelectionPhase::ConfirmPending
        } else if self.latest_preview.is_some() {
            SelectionPhase::Previewing
        } else if self.proposal.is_some() {
            SelectionPhase::Proposed
        } else {
            SelectionPhase::Idle
        }
    }

    pub fn affordances(&self) -> Affordances {
        let idle_commit = self.commit.is_none();
        let has_proposal = self.proposal.is_some();
        Affordances {
            request_enabled: idle_commit && has_proposal,
            confirm_enabled: idle_commit && has_proposal && self.payment.is_some(),
            close_enabled: idle_commit,
        }
    }

    /// Preview a preset destination. Discards the current proposal at once.
    pub fn preview_quick(&mut self, index: usize) -> Result<PreviewTicket, SelectionError> {
        if self.destinations.get(index).is_none() {
            return Err(SelectionError::UnknownDestination {
                index,
                available: self.destinations.len(),
            });
        }
        Ok(self.begin_preview(RideOrigin::QuickIndex(index)))
    }

    /// Preview the host's active waypoint. A missing waypoint comes back as a
    /// declined preview.
    pub fn preview_waypoint(&mut self) -> PreviewTicket {
        self.begin_preview(RideOrigin::Waypoint)
    }

    fn begin_preview(&mut self, origin: RideOrigin) -> PreviewTicket {
        let id = self.issue_id();
        self.proposal = None;
        self.latest_preview = Some((id, origin));
        PreviewTicket {
            id,
            request: origin.destination_ref(),
        }
    }

    pub fn complete_preview(
        &mut self,
        id: RequestId,
        resolution: Resolution<PreviewQuote>,
    ) -> PreviewOutcome {
        let origin = match self.latest_preview {
            Some((latest, origin)) if latest == id => origin,
            _ => return PreviewOutcome::Stale,
        };
        self.latest_preview = None;
        match resolution {
            Resolution::Accepted(quote) => {
                self.proposal = Some(RideProposal::from_quote(origin, quote));
                PreviewOutcome::Proposed
            }
            Resolution::Declined(reason) => PreviewOutcome::Declined(reason),
            Resolution::Unreachable => PreviewOutcome::Unreachable,
        }
    }

    pub fn set_payment(&mut self, method: PaymentMethod) {
        self.payment = Some(method);
    }

    /// Build the `confirmRide` request. Requires a proposal and a payment method.
    pub fn confirm(&mut self, mode: RideMode) -> Result<CommitTicket, SelectionError> {
        if self.commit.is_some() {
            return Err(SelectionError::CommitInFlight);
        }
        let proposal = self
            .proposal
            .as_ref()
            .ok_or(SelectionError::MissingSelection(SelectionPart::Proposal))?;
        let payment = self
            .payment
            .ok_or(SelectionError::MissingSelection(SelectionPart::Payment))?;
        let request = CommitRequest::Confirm(proposal.pending_request(mode, payment));
        Ok(self.begin_commit(request))
    }

    /// Build the one-step `requestTaxi` request. Requires a proposal only.
    pub fn request_ride(&mut self, mode: RideMode) -> Result<CommitTicket, SelectionError> {
        if self.commit.is_some() {
            return Err(SelectionError::CommitInFlight);
        }
        let proposal = self
            .proposal
            .as_ref()
            .ok_or(SelectionError::MissingSelection(SelectionPart::Proposal))?;
        let request = CommitRequest::Direct(proposal.ride_request(mode));
        Ok(self.begin_commit(request))
    }

    fn begin_commit(&mut self, request: CommitRequest) -> CommitTicket {
        let id = self.issue_id();
        let ticket = CommitTicket { id, request };
        self.commit = Some((id, ticket.kind()));
        ticket
    }

    pub fn complete_commit(&mut self, id: RequestId, resolution: Resolution<()>) -> CommitOutcome {
        let kind = match self.commit {
            Some((pending, kind)) if pending == id => kind,
            _ => return CommitOutcome::Stale,
        };
        self.commit = None;
        match resolution {
            Resolution::Accepted(()) => {
                // A dispatched ride is confirmed next through `openConfirm`,
                // which commits the same proposal.
                if kind == CommitKind::Confirm {
                    self.proposal = None;
                    self.payment = None;
                    self.latest_preview = None;
                }
                CommitOutcome::Committed(kind)
            }
            Resolution::Declined(reason) => CommitOutcome::Declined { kind, reason },
            Resolution::Unreachable => CommitOutcome::Unreachable(kind),
        }
    }

    fn issue_id(&mut self) -> RequestId {
        self.next_seq += 1;
        RequestId {
            session: self.session,
            seq: self.next_seq,
        }
    }
}
