use serde_json::json;

use super::*;
use crate::contract::DestinationRef;

fn selection_with(names: &[&str]) -> RideSelection {
    RideSelection::new(
        SessionId::new(1),
        QuickDestinations::from_names(names.iter().copied()),
        None,
    )
}

fn quote(fare: f64, eta_secs: u64, preset: Option<&str>) -> Resolution<PreviewQuote> {
    Resolution::Accepted(PreviewQuote {
        fare,
        eta_secs,
        preset: preset.map(str::to_string),
    })
}

fn proposed(selection: &mut RideSelection, index: usize, fare: f64, eta_secs: u64) {
    let ticket = selection.preview_quick(index).expect("destination exists");
    assert_eq!(
        selection.complete_preview(ticket.id, quote(fare, eta_secs, Some("Airport"))),
        PreviewOutcome::Proposed
    );
}

#[test]
fn new_selection_is_idle() {
    let selection = selection_with(&["Airport"]);
    assert_eq!(selection.phase(), SelectionPhase::Idle);
    assert!(selection.proposal().is_none());
    assert!(selection.payment().is_none());
    assert_eq!(
        selection.affordances(),
        Affordances {
            request_enabled: false,
            confirm_enabled: false,
            close_enabled: true,
        }
    );
}

#[test]
fn preview_quick_sends_one_based_index() {
    let mut selection = selection_with(&["Airport", "Pier", "Casino"]);
    for index in 0..selection.destinations().len() {
        let ticket = selection.preview_quick(index).expect("in range");
        assert_eq!(ticket.request.quick_index(), Some(index as u32 + 1));
        assert!(!ticket.request.is_waypoint());
    }
}

#[test]
fn preview_quick_out_of_range_issues_nothing() {
    let mut selection = selection_with(&["Airport"]);
    let error = selection.preview_quick(4).expect_err("out of range");
    assert_eq!(
        error,
        SelectionError::UnknownDestination {
            index: 4,
            available: 1
        }
    );
    assert_eq!(selection.phase(), SelectionPhase::Idle);
}

#[test]
fn preview_waypoint_requests_waypoint() {
    let mut selection = selection_with(&[]);
    let ticket = selection.preview_waypoint();
    assert_eq!(ticket.request, DestinationRef::waypoint());
    assert_eq!(selection.phase(), SelectionPhase::Previewing);

    selection.complete_preview(ticket.id, quote(20.0, 90, Some("ignored")));
    let proposal = selection.proposal().expect("proposal");
    assert_eq!(proposal.origin(), RideOrigin::Waypoint);
    assert_eq!(proposal.preset_name(), None);
}

#[test]
fn successful_preview_stores_proposal() {
    let mut selection = selection_with(&["Airport", "Pier"]);
    let ticket = selection.preview_quick(1).expect("in range");
    assert_eq!(selection.phase(), SelectionPhase::Previewing);

    let outcome = selection.complete_preview(ticket.id, quote(35.5, 125, Some("Pier")));
    assert_eq!(outcome, PreviewOutcome::Proposed);
    assert_eq!(selection.phase(), SelectionPhase::Proposed);

    let proposal = selection.proposal().expect("proposal");
    assert_eq!(proposal.origin(), RideOrigin::QuickIndex(1));
    assert_eq!(proposal.fare(), 35.5);
    assert_eq!(proposal.eta_secs(), 125);
    assert_eq!(proposal.preset_name(), Some("Pier"));
    assert!(selection.affordances().request_enabled);
}

#[test]
fn new_preview_discards_held_proposal_before_answer() {
    let mut selection = selection_with(&["Airport", "Pier"]);
    proposed(&mut selection, 0, 10.0, 60);

    selection.preview_quick(1).expect("in range");
    assert!(selection.proposal().is_none());
    assert!(!selection.affordances().request_enabled);
}

#[test]
fn declined_preview_leaves_no_proposal() {
    let mut selection = selection_with(&["Airport"]);
    proposed(&mut selection, 0, 10.0, 60);

    let ticket = selection.preview_waypoint();
    let outcome = selection.complete_preview(
        ticket.id,
        Resolution::Declined("No waypoint set".to_string()),
    );
    assert_eq!(outcome, PreviewOutcome::Declined("No waypoint set".to_string()));
    assert_eq!(selection.phase(), SelectionPhase::Idle);
    assert!(selection.proposal().is_none());
}

#[test]
fn unreachable_preview_leaves_no_proposal() {
    let mut selection = selection_with(&["Airport"]);
    let ticket = selection.preview_quick(0).expect("in range");
    assert_eq!(
        selection.complete_preview(ticket.id, Resolution::Unreachable),
        PreviewOutcome::Unreachable
    );
    assert_eq!(selection.phase(), SelectionPhase::Idle);
}

#[test]
fn last_issued_preview_wins_when_answers_arrive_out_of_order() {
    let mut selection = selection_with(&["Airport", "Pier"]);
    let first = selection.preview_quick(0).expect("in range");
    let second = selection.preview_quick(1).expect("in range");

    assert_eq!(
        selection.complete_preview(second.id, quote(22.0, 300, Some("Pier"))),
        PreviewOutcome::Proposed
    );
    assert_eq!(
        selection.complete_preview(first.id, quote(99.0, 900, Some("Airport"))),
        PreviewOutcome::Stale
    );

    let proposal = selection.proposal().expect("proposal");
    assert_eq!(proposal.origin(), RideOrigin::QuickIndex(1));
    assert_eq!(proposal.fare(), 22.0);
}

#[test]
fn superseded_answer_arriving_first_is_ignored() {
    let mut selection = selection_with(&["Airport", "Pier"]);
    let first = selection.preview_quick(0).expect("in range");
    let second = selection.preview_quick(1).expect("in range");

    assert_eq!(
        selection.complete_preview(first.id, quote(99.0, 900, None)),
        PreviewOutcome::Stale
    );
    assert_eq!(selection.phase(), SelectionPhase::Previewing);
    assert!(selection.proposal().is_none());

    selection.complete_preview(second.id, quote(22.0, 300, None));
    assert_eq!(selection.proposal().map(RideProposal::fare), Some(22.0));
}

#[test]
fn confirm_without_preview_is_missing_selection() {
    let mut selection = selection_with(&["Airport"]);
    selection.set_payment(PaymentMethod::Bank);
    assert_eq!(
        selection.confirm(RideMode::default()),
        Err(SelectionError::MissingSelection(SelectionPart::Proposal))
    );
    assert_eq!(selection.phase(), SelectionPhase::Idle);
}

#[test]
fn confirm_without_payment_is_missing_selection() {
    let mut selection = selection_with(&["Airport"]);
    proposed(&mut selection, 0, 10.0, 60);
    let error = selection
        .confirm(RideMode::default())
        .expect_err("payment missing");
    assert_eq!(error, SelectionError::MissingSelection(SelectionPart::Payment));
    assert_eq!(error.to_string(), "Please select a payment method first.");
    assert_eq!(selection.phase(), SelectionPhase::Proposed);
}

#[test]
fn confirm_carries_payment_and_exact_quote() {
    let mut selection = selection_with(&["Airport"]);
    proposed(&mut selection, 0, 48.25, 185);
    selection.set_payment(PaymentMethod::Cash);

    let ticket = selection.confirm(RideMode::new("watch")).expect("ready");
    assert_eq!(selection.phase(), SelectionPhase::ConfirmPending);
    let CommitRequest::Confirm(request) = &ticket.request else {
        panic!("expected confirm request");
    };
    assert_eq!(request.payment(), PaymentMethod::Cash);
    assert_eq!(
        serde_json::to_value(request).expect("serialize"),
        json!({
            "mode": "watch",
            "payment": "cash",
            "quickIndex": 1,
            "preset": "Airport",
            "fare": 48.25,
            "eta": 185,
        })
    );
}

#[test]
fn close_and_second_commit_blocked_while_confirm_pending() {
    let mut selection = selection_with(&["Airport"]);
    proposed(&mut selection, 0, 10.0, 60);
    selection.set_payment(PaymentMethod::Bank);
    selection.confirm(RideMode::default()).expect("ready");

    assert!(!selection.affordances().close_enabled);
    assert_eq!(
        selection.confirm(RideMode::default()),
        Err(SelectionError::CommitInFlight)
    );
    assert_eq!(
        selection.request_ride(RideMode::default()),
        Err(SelectionError::CommitInFlight)
    );
}

#[test]
fn confirmed_ride_clears_selection() {
    let mut selection = selection_with(&["Airport"]);
    proposed(&mut selection, 0, 10.0, 60);
    selection.set_payment(PaymentMethod::Bank);
    let ticket = selection.confirm(RideMode::default()).expect("ready");

    assert_eq!(
        selection.complete_commit(ticket.id, Resolution::Accepted(())),
        CommitOutcome::Committed(CommitKind::Confirm)
    );
    assert_eq!(selection.phase(), SelectionPhase::Idle);
    assert!(selection.proposal().is_none());
    assert!(selection.payment().is_none());
}

#[test]
fn declined_confirm_keeps_proposal_and_payment_for_retry() {
    let mut selection = selection_with(&["Airport"]);
    proposed(&mut selection, 0, 10.0, 60);
    selection.set_payment(PaymentMethod::Cash);
    let ticket = selection.confirm(RideMode::default()).expect("ready");

    assert_eq!(
        selection.complete_commit(
            ticket.id,
            Resolution::Declined("Not enough cash".to_string())
        ),
        CommitOutcome::Declined {
            kind: CommitKind::Confirm,
            reason: "Not enough cash".to_string(),
        }
    );
    assert_eq!(selection.phase(), SelectionPhase::Proposed);
    assert_eq!(selection.payment(), Some(PaymentMethod::Cash));

    let retry = selection.confirm(RideMode::default()).expect("retry allowed");
    assert_ne!(retry.id, ticket.id);
}

#[test]
fn request_ride_needs_only_a_proposal() {
    let mut selection = selection_with(&[]);
    assert_eq!(
        selection.request_ride(RideMode::default()),
        Err(SelectionError::MissingSelection(SelectionPart::Proposal))
    );

    let ticket = selection.preview_waypoint();
    selection.complete_preview(ticket.id, quote(15.0, 40, None));
    let ticket = selection
        .request_ride(RideMode::new("fast"))
        .expect("proposal held");
    assert_eq!(ticket.kind(), CommitKind::Direct);
    let CommitRequest::Direct(request) = &ticket.request else {
        panic!("expected direct request");
    };
    assert_eq!(
        serde_json::to_value(request).expect("serialize"),
        json!({ "mode": "fast", "useWaypoint": true, "fare": 15, "eta": 40 })
    );
}

#[test]
fn unknown_commit_answer_is_stale() {
    let mut selection = selection_with(&["Airport"]);
    proposed(&mut selection, 0, 10.0, 60);
    let preview = selection.preview_quick(0).expect("in range");
    assert_eq!(
        selection.complete_commit(preview.id, Resolution::Accepted(())),
        CommitOutcome::Stale
    );
}

#[test]
fn request_ids_are_scoped_to_session() {
    let mut first = selection_with(&["Airport"]);
    let mut second = RideSelection::new(
        SessionId::new(2),
        QuickDestinations::from_names(["Airport"]),
        None,
    );
    let old = first.preview_quick(0).expect("in range");
    let current = second.preview_quick(0).expect("in range");
    assert_eq!(old.id.seq(), current.id.seq());
    assert_ne!(old.id, current.id);
    assert_eq!(
        second.complete_preview(old.id, quote(1.0, 1, None)),
        PreviewOutcome::Stale
    );
}

#[test]
fn dispatched_ride_keeps_proposal_for_the_confirm_step() {
    let mut selection = selection_with(&["Airport", "Pier"]);
    proposed(&mut selection, 1, 27.0, 140);
    let dispatch = selection
        .request_ride(RideMode::default())
        .expect("proposal held");
    assert_eq!(
        selection.complete_commit(dispatch.id, Resolution::Accepted(())),
        CommitOutcome::Committed(CommitKind::Direct)
    );
    assert_eq!(selection.phase(), SelectionPhase::Proposed);

    selection.set_payment(PaymentMethod::Cash);
    let confirm = selection.confirm(RideMode::default()).expect("still ready");
    let CommitRequest::Confirm(request) = &confirm.request else {
        panic!("expected confirm request");
    };
    assert_eq!(request.payment(), PaymentMethod::Cash);
    assert_eq!(request.ride().fare(), 27.0);
    assert_eq!(request.ride().destination(), DestinationRef::quick(2));

    selection.complete_commit(confirm.id, Resolution::Accepted(()));
    assert_eq!(selection.phase(), SelectionPhase::Idle);
    assert!(selection.payment().is_none());
}
