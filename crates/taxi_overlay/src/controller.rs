//! Overlay controller: the single task that owns overlay state.
//!
//! User actions and push events are applied synchronously, in the order they
//! arrive. Host requests are spawned into a [`JoinSet`]; their answers come
//! back through the same loop and are matched against the session and request
//! that issued them. Side effects (`playSound`, `close`) go into a second set
//! that nothing waits on except shutdown; their failures only reach the debug
//! log.

use std::future::Future;

use taxi_core::contract::{
    ConfirmPreview, HostReply, HostVerdict, Notification, OverlayConfig, PaymentMethod,
    PreviewResponse, PushEvent, RideMode,
};
use taxi_core::destinations::QuickDestinations;
use taxi_core::format::{error_message, UNAVAILABLE_MESSAGE};
use taxi_core::hud::{HudPresenter, HudSnapshot};
use taxi_core::selection::{
    CommitKind, CommitOutcome, CommitRequest, CommitTicket, PreviewOutcome, PreviewTicket,
    RequestId, Resolution, RideSelection, SelectionError, SelectionPhase, SessionId,
};
use taxi_core::view::{confirm_modal, control_updates, proposal_update, ViewUpdate};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::adapters::host::{HostChannel, HostChannelError};
use crate::adapters::push::PushInbox;
use crate::settings::OverlaySettings;
use crate::shell::{OverlayView, UserAction};

const COMPONENT: &str = "overlay_controller";

enum Completion {
    Preview {
        id: RequestId,
        result: Result<PreviewResponse, HostChannelError>,
    },
    Commit {
        id: RequestId,
        result: Result<HostReply, HostChannelError>,
    },
}

/// State that lives from `openUI` to `hideUI`.
struct Session {
    selection: RideSelection,
    config: OverlayConfig,
}

pub struct OverlayController<C, V> {
    channel: C,
    view: V,
    settings: OverlaySettings,
    mode: RideMode,
    session: Option<Session>,
    last_config: Option<OverlayConfig>,
    last_session: SessionId,
    hud: HudPresenter,
    in_flight: JoinSet<Completion>,
    side_effects: JoinSet<()>,
}

impl<C: HostChannel, V: OverlayView> OverlayController<C, V> {
    pub fn new(channel: C, view: V, settings: OverlaySettings) -> Self {
        Self {
            mode: settings.default_mode.clone(),
            hud: HudPresenter::new(settings.popup_duration()),
            channel,
            view,
            settings,
            session: None,
            last_config: None,
            last_session: SessionId::new(0),
            in_flight: JoinSet::new(),
            side_effects: JoinSet::new(),
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn into_view(self) -> V {
        self.view
    }

    /// Selection of the open session, if the overlay is open.
    pub fn selection(&self) -> Option<&RideSelection> {
        self.session.as_ref().map(|session| &session.selection)
    }

    pub fn phase(&self) -> Option<SelectionPhase> {
        self.selection().map(RideSelection::phase)
    }

    pub fn hud(&self) -> &HudPresenter {
        &self.hud
    }

    pub fn mode(&self) -> &RideMode {
        &self.mode
    }

    pub fn has_in_flight(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Drive the controller until both inputs are closed and nothing is
    /// outstanding. Returns the view for inspection.
    pub async fn run(
        mut self,
        mut actions: mpsc::UnboundedReceiver<UserAction>,
        mut inbox: PushInbox,
    ) -> V {
        let mut actions_open = true;
        let mut pushes_open = true;
        loop {
            if !actions_open
                && !pushes_open
                && self.in_flight.is_empty()
                && self.side_effects.is_empty()
                && self.hud.popup_deadline().is_none()
            {
                break;
            }
            let deadline = self.popup_deadline();
            tokio::select! {
                event = inbox.recv(), if pushes_open => match event {
                    Some(event) => self.handle_push(event),
                    None => pushes_open = false,
                },
                action = actions.recv(), if actions_open => match action {
                    Some(action) => self.handle_action(action),
                    None => actions_open = false,
                },
                Some(joined) = self.in_flight.join_next(), if !self.in_flight.is_empty() => {
                    self.apply_joined(joined);
                }
                Some(joined) = self.side_effects.join_next(), if !self.side_effects.is_empty() => {
                    self.reap_side_effect(joined);
                }
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    self.expire_popup();
                }
                else => break,
            }
        }
        debug!(component = COMPONENT, event = "controller_stopped");
        self.view
    }

    /// Wait for the next host answer and apply it. Returns `false` when
    /// nothing was outstanding.
    pub async fn next_completion(&mut self) -> bool {
        match self.in_flight.join_next().await {
            Some(joined) => {
                self.apply_joined(joined);
                true
            }
            None => false,
        }
    }

    pub fn popup_deadline(&self) -> Option<Instant> {
        self.hud.popup_deadline().map(Instant::from_std)
    }

    pub fn expire_popup(&mut self) {
        if let Some(update) = self.hud.expire_popup(Instant::now().into_std()) {
            self.view.apply(update);
        }
    }

    pub fn handle_action(&mut self, action: UserAction) {
        match action {
            UserAction::PreviewQuick { index } => self.preview_quick(index),
            UserAction::PreviewWaypoint => self.preview_waypoint(),
            UserAction::SetPayment { method } => self.set_payment(method),
            UserAction::SetMode { mode } => self.mode = mode,
            UserAction::RequestRide => self.request_ride(),
            UserAction::Confirm => self.confirm(),
            UserAction::CancelConfirm => {
                self.view.apply(ViewUpdate::ConfirmModalHidden);
                self.play_sound();
            }
            UserAction::Close => self.close(),
            UserAction::ShowQuickList => {
                if let Some(session) = &self.session {
                    self.view.apply(ViewUpdate::QuickList {
                        labels: session.selection.destinations().labels(),
                    });
                }
            }
        }
    }

    pub fn handle_push(&mut self, event: PushEvent) {
        debug!(
            component = COMPONENT,
            event = "push_received",
            action = event.action()
        );
        match event {
            PushEvent::OpenUi { config } => self.open(config),
            PushEvent::HideUi => self.hide(),
            PushEvent::UpdateHud {
                eta,
                distance,
                fare,
            } => {
                let update = self
                    .hud
                    .update(HudSnapshot::from_readings(eta, distance, fare));
                self.view.apply(update);
            }
            PushEvent::ClearHud => {
                let update = self.hud.clear();
                self.view.apply(update);
            }
            PushEvent::FarePopup { fare } => {
                let update = self.hud.show_popup(fare, Instant::now().into_std());
                self.view.apply(update);
            }
            PushEvent::OpenConfirm { data } => self.open_confirm(data.unwrap_or_default()),
        }
    }

    fn open(&mut self, config: Option<OverlayConfig>) {
        let config = config
            .or_else(|| self.last_config.clone())
            .unwrap_or_default();
        self.last_config = Some(config.clone());
        self.last_session = self.last_session.next();

        let selection = RideSelection::new(
            self.last_session,
            QuickDestinations::from_config(&config),
            self.settings.default_payment,
        );
        info!(
            component = COMPONENT,
            event = "overlay_opened",
            session = %self.last_session,
            destinations = selection.destinations().len()
        );

        self.view.apply(ViewUpdate::QuickList {
            labels: selection.destinations().labels(),
        });
        self.view.apply(ViewUpdate::QuickHighlight { index: None });
        self.view.apply(proposal_update(None));
        self.view.apply(ViewUpdate::clear_info());
        self.session = Some(Session { selection, config });
        self.render_controls();
        self.view.apply(ViewUpdate::OverlayVisible { visible: true });
    }

    fn hide(&mut self) {
        if let Some(session) = self.session.take() {
            if session.selection.phase() == SelectionPhase::ConfirmPending {
                warn!(
                    component = COMPONENT,
                    event = "overlay_hidden_during_commit",
                    session = %session.selection.session()
                );
            }
            info!(
                component = COMPONENT,
                event = "overlay_closed",
                session = %session.selection.session()
            );
        }
        self.view.apply(ViewUpdate::OverlayVisible { visible: false });
    }

    fn open_confirm(&mut self, preview: ConfirmPreview) {
        self.view.apply(confirm_modal(&preview));
        let sound_effects = self
            .session
            .as_ref()
            .map(|session| &session.config)
            .or(self.last_config.as_ref())
            .is_some_and(OverlayConfig::sound_effects_enabled);
        if sound_effects {
            self.play_sound();
        }
    }

    fn preview_quick(&mut self, index: usize) {
        let Some(session) = self.session.as_mut() else {
            return ignored_without_session("preview_quick");
        };
        match session.selection.preview_quick(index) {
            Ok(ticket) => {
                self.view.apply(ViewUpdate::QuickHighlight { index: Some(index) });
                self.issue_preview(ticket);
            }
            Err(error) => self.reject(error),
        }
    }

    fn preview_waypoint(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return ignored_without_session("preview_waypoint");
        };
        let ticket = session.selection.preview_waypoint();
        self.view.apply(ViewUpdate::QuickHighlight { index: None });
        self.issue_preview(ticket);
    }

    fn issue_preview(&mut self, ticket: PreviewTicket) {
        let id = ticket.id;
        info!(
            component = COMPONENT,
            event = "preview_issued",
            request = %id,
            quick_index = ticket.request.quick_index(),
            waypoint = ticket.request.is_waypoint()
        );
        let response = self.channel.preview(ticket.request);
        self.in_flight.spawn(async move {
            Completion::Preview {
                id,
                result: response.await,
            }
        });
        self.render_controls();
    }

    fn set_payment(&mut self, method: PaymentMethod) {
        let Some(session) = self.session.as_mut() else {
            return ignored_without_session("set_payment");
        };
        session.selection.set_payment(method);
        self.render_controls();
        self.play_sound();
    }

    fn confirm(&mut self) {
        let mode = self.mode.clone();
        let Some(session) = self.session.as_mut() else {
            return ignored_without_session("confirm");
        };
        match session.selection.confirm(mode) {
            Ok(ticket) => self.issue_commit(ticket),
            Err(error) => self.reject(error),
        }
    }

    fn request_ride(&mut self) {
        let mode = self.mode.clone();
        let Some(session) = self.session.as_mut() else {
            return ignored_without_session("request_ride");
        };
        match session.selection.request_ride(mode) {
            Ok(ticket) => self.issue_commit(ticket),
            Err(error) => self.reject(error),
        }
    }

    fn issue_commit(&mut self, ticket: CommitTicket) {
        let id = ticket.id;
        let kind = ticket.kind();
        info!(
            component = COMPONENT,
            event = "commit_issued",
            request = %id,
            kind = ?kind
        );
        match ticket.request {
            CommitRequest::Confirm(request) => {
                let response = self.channel.confirm_ride(request);
                self.in_flight.spawn(async move {
                    Completion::Commit {
                        id,
                        result: response.await,
                    }
                });
            }
            CommitRequest::Direct(request) => {
                let response = self.channel.request_taxi(request);
                self.in_flight.spawn(async move {
                    Completion::Commit {
                        id,
                        result: response.await,
                    }
                });
            }
        }
        self.render_controls();
    }

    fn close(&mut self) {
        let commit_in_flight = self
            .selection()
            .is_some_and(|selection| !selection.affordances().close_enabled);
        if commit_in_flight {
            return self.reject(SelectionError::CommitInFlight);
        }
        self.close_host();
    }

    fn reject(&mut self, error: SelectionError) {
        info!(component = COMPONENT, event = "action_rejected", %error);
        self.view.apply(ViewUpdate::info(error.to_string()));
    }

    fn apply_joined(&mut self, joined: Result<Completion, JoinError>) {
        match joined {
            Ok(Completion::Preview { id, result }) => self.apply_preview(id, result),
            Ok(Completion::Commit { id, result }) => self.apply_commit(id, result),
            Err(error) => warn!(component = COMPONENT, event = "request_task_failed", %error),
        }
    }

    fn apply_preview(&mut self, id: RequestId, result: Result<PreviewResponse, HostChannelError>) {
        let (resolution, failure) = split_failure(
            result.and_then(|response| response.into_verdict().map_err(HostChannelError::from)),
        );
        let Some(session) = self.session_for(id) else {
            return;
        };
        match session.selection.complete_preview(id, resolution) {
            PreviewOutcome::Stale => {
                debug!(component = COMPONENT, event = "preview_superseded", request = %id);
                return;
            }
            PreviewOutcome::Proposed => {
                let update = proposal_update(session.selection.proposal());
                self.view.apply(update);
                self.view.apply(ViewUpdate::clear_info());
            }
            PreviewOutcome::Declined(reason) => {
                info!(component = COMPONENT, event = "preview_declined", request = %id, %reason);
                self.view.apply(ViewUpdate::info(error_message(&reason)));
            }
            PreviewOutcome::Unreachable => {
                if let Some(error) = failure {
                    warn!(component = COMPONENT, event = "preview_failed", request = %id, %error);
                }
                self.view.apply(ViewUpdate::info(UNAVAILABLE_MESSAGE));
            }
        }
        self.render_controls();
    }

    fn apply_commit(&mut self, id: RequestId, result: Result<HostReply, HostChannelError>) {
        let (resolution, failure) = split_failure(result.map(HostReply::into_verdict));
        let Some(session) = self.session_for(id) else {
            return;
        };
        match session.selection.complete_commit(id, resolution) {
            CommitOutcome::Stale => {
                debug!(component = COMPONENT, event = "commit_stale", request = %id);
                return;
            }
            CommitOutcome::Committed(kind) => {
                info!(component = COMPONENT, event = "ride_committed", request = %id, kind = ?kind);
                self.view.apply(ViewUpdate::clear_info());
                // A dispatched ride keeps its proposal for the host's confirm prompt.
                if kind == CommitKind::Confirm {
                    self.view.apply(proposal_update(None));
                    self.view.apply(ViewUpdate::QuickHighlight { index: None });
                    self.view.apply(ViewUpdate::ConfirmModalHidden);
                    self.close_host();
                }
            }
            CommitOutcome::Declined { kind, reason } => {
                info!(
                    component = COMPONENT,
                    event = "commit_declined",
                    request = %id,
                    kind = ?kind,
                    %reason
                );
                self.view.apply(ViewUpdate::info(error_message(&reason)));
            }
            CommitOutcome::Unreachable(kind) => {
                if let Some(error) = failure {
                    warn!(
                        component = COMPONENT,
                        event = "commit_failed",
                        request = %id,
                        kind = ?kind,
                        %error
                    );
                }
                self.view.apply(ViewUpdate::info(UNAVAILABLE_MESSAGE));
            }
        }
        self.render_controls();
    }

    /// The open session, if `id` belongs to it.
    fn session_for(&mut self, id: RequestId) -> Option<&mut Session> {
        let session = self
            .session
            .as_mut()
            .filter(|session| session.selection.session() == id.session());
        if session.is_none() {
            debug!(component = COMPONENT, event = "response_for_closed_session", request = %id);
        }
        session
    }

    fn render_controls(&mut self) {
        if let Some(session) = &self.session {
            for update in control_updates(&session.selection) {
                self.view.apply(update);
            }
        }
    }

    fn play_sound(&mut self) {
        let sound = self.channel.notify(Notification::PlaySound);
        self.spawn_side_effect("play_sound", sound);
    }

    fn close_host(&mut self) {
        let close = self.channel.close();
        self.spawn_side_effect("close", close);
    }

    /// Never awaited on the main flow; `run` drains them before returning.
    fn spawn_side_effect<F>(&mut self, effect: &'static str, future: F)
    where
        F: Future<Output = Result<(), HostChannelError>> + Send + 'static,
    {
        self.side_effects.spawn(async move {
            if let Err(error) = future.await {
                debug!(component = COMPONENT, event = "side_effect_failed", effect, %error);
            }
        });
    }

    fn reap_side_effect(&mut self, joined: Result<(), JoinError>) {
        if let Err(error) = joined {
            warn!(component = COMPONENT, event = "side_effect_task_failed", %error);
        }
    }
}

fn ignored_without_session(action: &'static str) {
    debug!(component = COMPONENT, event = "action_without_session", action);
}

/// Set a transport or decode failure aside; it is logged only if the answer
/// still applies.
fn split_failure<T>(
    answer: Result<HostVerdict<T>, HostChannelError>,
) -> (Resolution<T>, Option<HostChannelError>) {
    match answer {
        Ok(verdict) => (Resolution::from(verdict), None),
        Err(error) => (Resolution::Unreachable, Some(error)),
    }
}
