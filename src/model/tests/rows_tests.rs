//! Unit tests for shared row storage and request tracking.

use crate::backend::domain::{BackendEvent, BackendStatus, ErrorKind, RequestId};
use crate::model::{ModelEvent, RowModel};
use crate::test_support::identifier;
use rstest::{fixture, rstest};

#[fixture]
fn rows() -> RowModel<&'static str> {
    RowModel::new()
}

#[rstest]
fn loading_flips_only_at_the_empty_boundary(mut rows: RowModel<&'static str>) {
    let mut events = Vec::new();
    let first = RequestId::new();
    let second = RequestId::new();

    rows.track(first, identifier("a"), &mut events);
    rows.track(second, identifier("b"), &mut events);
    assert_eq!(events, vec![ModelEvent::LoadingChanged(true)]);

    events.clear();
    assert_eq!(rows.untrack(first, &mut events), Some(identifier("a")));
    assert!(events.is_empty(), "one request is still pending");
    assert_eq!(rows.untrack(second, &mut events), Some(identifier("b")));
    assert_eq!(events, vec![ModelEvent::LoadingChanged(false)]);
}

#[rstest]
fn untracking_an_unknown_request_is_silent(mut rows: RowModel<&'static str>) {
    let mut events = Vec::new();

    assert_eq!(rows.untrack(RequestId::new(), &mut events), None);
    assert!(events.is_empty());
}

#[rstest]
fn append_reports_the_inserted_range(mut rows: RowModel<&'static str>) {
    let mut events = Vec::new();
    rows.append(vec!["x"], &mut events);
    events.clear();

    rows.append(vec!["y", "z"], &mut events);
    rows.append(Vec::new(), &mut events);

    assert_eq!(rows.rows(), ["x", "y", "z"].as_slice());
    assert_eq!(
        events,
        vec![
            ModelEvent::RowsInserted { first: 1, last: 2 },
            ModelEvent::CountChanged(3),
        ]
    );
}

#[rstest]
fn clear_drops_rows_and_pending_requests(mut rows: RowModel<&'static str>) {
    let mut events = Vec::new();
    rows.track(RequestId::new(), identifier("a"), &mut events);
    rows.append(vec!["x", "y"], &mut events);
    events.clear();

    rows.clear(&mut events);

    assert_eq!(rows.count(), 0);
    assert!(!rows.is_loading());
    assert_eq!(
        events,
        vec![
            ModelEvent::LoadingChanged(false),
            ModelEvent::RowsRemoved { first: 0, last: 1 },
            ModelEvent::CountChanged(0),
        ]
    );

    events.clear();
    rows.clear(&mut events);
    assert!(events.is_empty(), "clearing an empty model changes nothing");
}

#[rstest]
fn leaving_launched_abandons_only_that_backend(mut rows: RowModel<&'static str>) {
    let mut events = Vec::new();
    let kept = RequestId::new();
    rows.track(RequestId::new(), identifier("a"), &mut events);
    rows.track(kept, identifier("b"), &mut events);
    events.clear();

    let handled = rows.apply_backend_event(
        &BackendEvent::StatusChanged {
            backend: identifier("a"),
            status: BackendStatus::Invalid,
        },
        &mut events,
    );

    assert!(handled);
    assert!(events.is_empty());
    assert_eq!(rows.pending_count(), 1);
    assert!(rows.is_tracking(&identifier("b"), kept));
}

#[rstest]
fn a_late_launched_notification_does_not_revive_abandoned_requests(
    mut rows: RowModel<&'static str>,
) {
    let mut events = Vec::new();
    let request = RequestId::new();
    rows.track(request, identifier("a"), &mut events);
    events.clear();

    for status in [BackendStatus::Invalid, BackendStatus::Launched] {
        rows.apply_backend_event(
            &BackendEvent::StatusChanged {
                backend: identifier("a"),
                status,
            },
            &mut events,
        );
    }

    assert!(!rows.is_loading());
    assert!(!rows.is_tracking(&identifier("a"), request));
    assert_eq!(events, vec![ModelEvent::LoadingChanged(false)]);
}

#[rstest]
#[case(ErrorKind::BackendWarning, true)]
#[case(ErrorKind::NotImplemented, true)]
#[case(ErrorKind::Other, true)]
#[case(ErrorKind::InvalidRequestType, false)]
fn errors_resolve_tracked_requests(
    mut rows: RowModel<&'static str>,
    #[case] kind: ErrorKind,
    #[case] reported: bool,
) {
    let mut events = Vec::new();
    let request = RequestId::new();
    rows.track(request, identifier("a"), &mut events);
    events.clear();

    rows.apply_backend_event(
        &BackendEvent::ErrorRegistered {
            backend: identifier("a"),
            request,
            kind,
            message: "upstream unavailable".to_owned(),
        },
        &mut events,
    );

    assert!(!rows.is_loading());
    assert_eq!(events.first(), Some(&ModelEvent::LoadingChanged(false)));
    let reports = events
        .iter()
        .filter(|event| matches!(event, ModelEvent::ErrorReported { .. }))
        .count();
    assert_eq!(reports, usize::from(reported));
}

#[rstest]
fn errors_from_another_backend_are_ignored(mut rows: RowModel<&'static str>) {
    let mut events = Vec::new();
    let request = RequestId::new();
    rows.track(request, identifier("a"), &mut events);
    events.clear();

    rows.apply_backend_event(
        &BackendEvent::ErrorRegistered {
            backend: identifier("b"),
            request,
            kind: ErrorKind::Other,
            message: String::new(),
        },
        &mut events,
    );

    assert!(rows.is_loading());
    assert!(events.is_empty());
}
