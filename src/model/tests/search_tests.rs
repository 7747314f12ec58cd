//! Unit tests for the fan-out search models.

use crate::backend::BackendWrapper;
use crate::backend::domain::{BackendEvent, Capability, ErrorKind, RequestId};
use crate::entity::Line;
use crate::events::{EventListener, RecordingListener};
use crate::manager::BackendManager;
use crate::model::{LineSearchModel, ModelEvent, StationSearchModel};
use crate::test_support::{ScriptedFactory, capabilities, identifier, station};
use rstest::rstest;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

struct Harness {
    manager: Arc<BackendManager>,
    model: Arc<StationSearchModel>,
    recorder: Arc<RecordingListener<ModelEvent>>,
}

impl Harness {
    fn backend(&self, name: &str) -> Arc<dyn BackendWrapper> {
        self.manager
            .backend(&identifier(name))
            .expect("backend should be managed")
    }

    fn pending(&self, name: &str) -> Vec<RequestId> {
        self.backend(name)
            .pending_requests()
            .iter()
            .map(|request| request.id())
            .collect()
    }

    fn only_pending(&self, name: &str) -> RequestId {
        let pending = self.pending(name);
        let [request] = pending.as_slice() else {
            panic!("expected exactly one pending request on {name}, got {pending:?}");
        };
        *request
    }
}

fn manager_with(capability: Capability) -> Arc<BackendManager> {
    Arc::new(BackendManager::new(Arc::new(ScriptedFactory {
        capabilities: capabilities(&[capability]),
    })))
}

async fn add_launched(manager: &BackendManager, name: &str) {
    manager.add_backend(identifier(name), name, BTreeMap::new());
    assert!(manager.launch_backend(&identifier(name)).await);
}

async fn attached(names: &[&str]) -> Harness {
    let manager = manager_with(Capability::SuggestStationFromString);
    for name in names {
        add_launched(&manager, name).await;
    }
    let model = StationSearchModel::new();
    model.set_backend_manager(Some(Arc::clone(&manager)));
    let recorder = RecordingListener::<ModelEvent>::new();
    let downgraded = Arc::downgrade(&recorder);
    let listener: Weak<dyn EventListener<ModelEvent>> = downgraded;
    model.subscribe(listener);
    Harness {
        manager,
        model,
        recorder,
    }
}

fn loading_changes(recorder: &RecordingListener<ModelEvent>) -> Vec<bool> {
    recorder
        .events()
        .into_iter()
        .filter_map(|event| match event {
            ModelEvent::LoadingChanged(loading) => Some(loading),
            _ => None,
        })
        .collect()
}

// ── Fan-out ────────────────────────────────────────────────────────

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn replies_accumulate_in_completion_order() {
    let harness = attached(&["a", "b"]).await;

    harness.model.search("abc");

    let from_a = harness.only_pending("a");
    let from_b = harness.only_pending("b");
    assert!(harness.model.is_loading());

    harness
        .backend("a")
        .core()
        .register_suggested_stations(from_a, vec![station("x", "Station X")]);
    let names: Vec<String> = harness.model.rows().into_iter().map(|row| row.name).collect();
    assert_eq!(names, vec!["Station X"]);
    assert!(harness.model.is_loading());

    harness
        .backend("b")
        .core()
        .register_suggested_stations(from_b, vec![station("y", "Station Y")]);
    let rows = harness.model.rows();
    let names: Vec<&str> = rows.iter().map(|row| row.name.as_str()).collect();
    assert_eq!(names, vec!["Station X", "Station Y"]);
    assert_eq!(
        rows.iter().map(|row| row.backend.as_str()).collect::<Vec<_>>(),
        vec!["a", "b"]
    );
    assert!(!harness.model.is_loading());
    assert_eq!(loading_changes(&harness.recorder), vec![true, false]);
}

#[rstest]
#[case("")]
#[case("ab")]
#[case("  ab  ")]
#[case("é\u{301}")]
#[tokio::test(flavor = "multi_thread")]
async fn short_queries_are_not_sent(#[case] text: &str) {
    let harness = attached(&["a"]).await;

    harness.model.search(text);

    assert!(harness.model.is_short());
    assert!(!harness.model.is_loading());
    assert!(harness.pending("a").is_empty());
    assert!(harness.recorder.events().is_empty(), "a fresh model starts short");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn long_enough_queries_clear_the_short_flag() {
    let harness = attached(&["a"]).await;

    harness.model.search("  abc ");

    assert!(!harness.model.is_short());
    assert_eq!(
        harness.recorder.events().first(),
        Some(&ModelEvent::ShortChanged(false))
    );
    let pending = harness.backend("a").pending_requests();
    assert_eq!(pending.len(), 1);

    harness.model.search("ab");
    assert!(harness.model.is_short());
    assert!(!harness.model.is_loading());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn only_launched_backends_are_queried() {
    let harness = attached(&["a"]).await;
    harness
        .manager
        .add_backend(identifier("idle"), "idle", BTreeMap::new());

    harness.model.search("central");

    assert_eq!(harness.pending("a").len(), 1);
    assert!(harness.pending("idle").is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn backends_without_the_capability_are_skipped() {
    let manager = manager_with(Capability::SuggestLineFromString);
    add_launched(&manager, "lines").await;
    let model = StationSearchModel::new();
    model.set_backend_manager(Some(Arc::clone(&manager)));

    model.search("central");

    assert!(!model.is_loading());
    let backend = manager
        .backend(&identifier("lines"))
        .expect("backend should be managed");
    assert!(backend.pending_requests().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn backends_added_later_are_observed() {
    let harness = attached(&["a"]).await;
    add_launched(&harness.manager, "late").await;

    harness.model.search("central");

    let request = harness.only_pending("late");
    harness
        .backend("late")
        .core()
        .register_suggested_stations(request, vec![station("s", "Late Station")]);
    assert_eq!(harness.model.count(), 1);
}

// ── Superseding and failures ───────────────────────────────────────

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn a_new_search_drops_stale_replies() {
    let harness = attached(&["a"]).await;
    harness.model.search("cent");
    let stale = harness.only_pending("a");

    harness.model.search("central");
    harness
        .backend("a")
        .core()
        .register_suggested_stations(stale, vec![station("old", "Old")]);

    assert_eq!(harness.model.count(), 0);
    assert!(harness.model.is_loading(), "the newer request is still pending");
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn user_visible_errors_are_reported() {
    let harness = attached(&["a"]).await;
    harness.model.search("central");
    let request = harness.only_pending("a");

    harness.backend("a").core().register_error(
        request,
        ErrorKind::BackendWarning,
        "upstream unavailable".to_owned(),
    );

    assert!(!harness.model.is_loading());
    assert!(harness.recorder.events().iter().any(|event| matches!(
        event,
        ModelEvent::ErrorReported { kind: ErrorKind::BackendWarning, message, .. }
            if message == "upstream unavailable"
    )));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mistyped_replies_resolve_silently() {
    let harness = attached(&["a"]).await;
    harness.model.search("central");
    let request = harness.only_pending("a");

    harness.backend("a").core().register_suggested_lines(
        request,
        vec![Line::new("u1", "U1").expect("line should be valid")],
    );

    assert!(!harness.model.is_loading());
    assert_eq!(harness.model.count(), 0);
    assert!(
        !harness
            .recorder
            .events()
            .iter()
            .any(|event| matches!(event, ModelEvent::ErrorReported { .. }))
    );
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stopping_a_backend_abandons_its_requests() {
    let harness = attached(&["a", "b"]).await;
    harness.model.search("central");

    assert!(harness.manager.stop_backend(&identifier("a")).await);
    assert!(harness.model.is_loading(), "b is still pending");

    assert!(harness.manager.remove_backend(&identifier("b")).await);
    assert!(!harness.model.is_loading());
    assert_eq!(loading_changes(&harness.recorder), vec![true, false]);
}

// ── Attachment ─────────────────────────────────────────────────────

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn detaching_clears_rows_and_stops_listening() {
    let harness = attached(&["a"]).await;
    harness.model.search("central");
    let request = harness.only_pending("a");

    harness.model.set_backend_manager(None);
    harness
        .backend("a")
        .core()
        .register_suggested_stations(request, vec![station("s", "Central")]);

    assert!(harness.model.backend_manager().is_none());
    assert!(!harness.model.is_loading());
    assert_eq!(harness.model.count(), 0);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rides_target_points_at_the_originating_backend() {
    let harness = attached(&["a", "b"]).await;
    harness.model.search("central");
    let request = harness.only_pending("b");
    harness
        .backend("b")
        .core()
        .register_suggested_stations(request, vec![station("s1", "Central")]);

    let (backend, target) = harness
        .model
        .rides_target(0)
        .expect("row 0 should have a target");

    assert_eq!(backend.identifier(), &identifier("b"));
    assert_eq!(target, station("s1", "Central"));
    assert!(harness.model.rides_target(1).is_none());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn line_search_fans_out_to_line_backends() {
    let manager = manager_with(Capability::SuggestLineFromString);
    add_launched(&manager, "lines").await;
    let model = LineSearchModel::new();
    model.set_backend_manager(Some(Arc::clone(&manager)));

    model.search("U12");

    let backend = manager
        .backend(&identifier("lines"))
        .expect("backend should be managed");
    let pending = backend.pending_requests();
    let [request] = pending.as_slice() else {
        panic!("expected one pending request, got {pending:?}");
    };
    backend.core().register_suggested_lines(
        request.id(),
        vec![Line::new("u12", "U12").expect("line should be valid")],
    );

    let rows = model.rows();
    assert_eq!(rows.len(), 1);
    assert!(matches!(rows.first(), Some(row) if row.name == "U12" && row.line.identifier() == "u12"));
    assert!(!model.is_loading());

    let unrelated = BackendEvent::CopyrightChanged {
        backend: identifier("lines"),
        copyright: String::new(),
    };
    EventListener::<BackendEvent>::on_event(model.as_ref(), &unrelated);
    assert_eq!(model.count(), 1);
}
