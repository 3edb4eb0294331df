//! End-to-end runs of the presentation pipeline against an in-memory stand-in
//! for the storage collaborator: format resolution, cache hits, bounded
//! retries, normalization and the observable state sequences.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use vitrine::format::{ModelFormat, ModelReference};
use vitrine::io::common::fetcher::{FetchError, RawPayloadFetcher};
use vitrine::scene::SceneGraph;
use vitrine::viewer::{
    FailureKind, FitSettings, ModelSelector, RetryPolicy, SceneCache, ViewState,
};

/// Serves canned payloads per URL, optionally failing the first n fetches of
/// a URL, and counts every call. URLs without a payload always fail. The
/// small latency keeps each fetch on the blocking pool long enough for the
/// observing test task to see the intermediate states.
struct FakeStorage {
    payloads: HashMap<String, Vec<u8>>,
    failures: Mutex<HashMap<String, u32>>,
    calls: AtomicU32,
    latency: Duration,
}

impl FakeStorage {
    fn new() -> Self {
        Self {
            payloads: HashMap::new(),
            failures: Mutex::new(HashMap::new()),
            calls: AtomicU32::new(0),
            latency: Duration::from_millis(10),
        }
    }

    fn serving(mut self, url: &str, payload: Vec<u8>) -> Self {
        self.payloads.insert(url.to_owned(), payload);
        self
    }

    fn failing_first(self, url: &str, times: u32) -> Self {
        self.failures
            .lock()
            .expect("failure table")
            .insert(url.to_owned(), times);
        self
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RawPayloadFetcher for FakeStorage {
    fn fetch_raw_owned(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.latency);

        if let Some(left) = self.failures.lock().expect("failure table").get_mut(url) {
            if *left > 0 {
                *left -= 1;
                return Err(FetchError::Status {
                    url: url.to_owned(),
                    code: 503,
                });
            }
        }

        self.payloads
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Transport {
                url: url.to_owned(),
                message: "connection refused".to_owned(),
            })
    }
}

/// A complete single-triangle binary container, assembled in memory. The
/// material's near-black base color is what the normalization assertions key
/// off.
fn triangle_glb() -> Vec<u8> {
    let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
    let bin: Vec<u8> = positions.iter().flat_map(|p| p.to_le_bytes()).collect();
    let json = serde_json::json!({
        "asset": { "version": "2.0" },
        "scene": 0,
        "scenes": [{ "nodes": [0] }],
        "nodes": [{ "mesh": 0, "name": "exhibit" }],
        "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "material": 0 }] }],
        "materials": [{
            "name": "unset",
            "pbrMetallicRoughness": { "baseColorFactor": [0.0, 0.0, 0.0, 1.0] }
        }],
        "accessors": [
            { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3" }
        ],
        "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
        "buffers": [{ "byteLength": 36 }]
    })
    .to_string();

    let mut chunks = Vec::new();
    for (magic, data) in [(*b"JSON", json.as_bytes()), (*b"BIN\0", bin.as_slice())] {
        chunks.extend_from_slice(&(data.len() as u32).to_le_bytes());
        chunks.extend_from_slice(&magic);
        chunks.extend_from_slice(data);
    }

    let mut out = Vec::new();
    out.extend_from_slice(b"glTF");
    out.extend_from_slice(&2u32.to_le_bytes());
    out.extend_from_slice(&((12 + chunks.len()) as u32).to_le_bytes());
    out.extend_from_slice(&chunks);
    out
}

fn triangle_obj() -> Vec<u8> {
    b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n".to_vec()
}

fn quick_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 2,
        base_delay: Duration::from_millis(25),
    }
}

fn selector_with(fetcher: Arc<FakeStorage>, policy: RetryPolicy) -> ModelSelector {
    ModelSelector::with_settings(
        fetcher,
        Arc::new(SceneCache::new()),
        policy,
        FitSettings::default(),
    )
}

fn label(state: &ViewState) -> String {
    match state {
        ViewState::Retrying { attempt, max } => format!("retrying({attempt}/{max})"),
        other => other.name().to_owned(),
    }
}

/// Presents the reference and records every observed state, starting with
/// the one already in the channel, until a terminal state arrives.
async fn drive(selector: &ModelSelector, reference: ModelReference) -> Vec<ViewState> {
    let mut rx = selector.subscribe();
    let mut seen = vec![rx.borrow().clone()];
    selector.present(reference);
    loop {
        rx.changed().await.expect("selector outlives the stream");
        let state = rx.borrow_and_update().clone();
        let terminal = state.is_terminal();
        seen.push(state);
        if terminal {
            return seen;
        }
    }
}

fn ready_scene(state: &ViewState) -> Arc<SceneGraph> {
    match state {
        ViewState::Ready { scene, .. } => scene.clone(),
        other => panic!("expected a ready state, got {}", other.name()),
    }
}

#[tokio::test]
async fn first_attempt_success_runs_idle_loading_ready() {
    let fetcher = Arc::new(FakeStorage::new().serving("https://cdn/a.glb", triangle_glb()));
    let selector = selector_with(fetcher.clone(), quick_policy());

    let states = drive(&selector, ModelReference::new("https://cdn/a.glb")).await;

    let labels: Vec<String> = states.iter().map(label).collect();
    assert_eq!(labels, vec!["idle", "loading", "ready"]);
    assert_eq!(fetcher.calls(), 1);

    // The handle went through normalization before it was published: the
    // near-black authored color is gone and the upload flag is set.
    let scene = ready_scene(states.last().unwrap());
    let material = &scene.roots[0].materials[0];
    let color = material.color.expect("standard materials carry a color");
    assert!(color.x + color.y + color.z > 0.1);
    assert!(material.needs_upload);
    assert!(scene.roots[0].cast_shadows);

    // A framed camera sits off-center and looks at the asset.
    match states.last().unwrap() {
        ViewState::Ready { camera, .. } => assert_ne!(camera.position, camera.look_at),
        _ => unreachable!(),
    }
}

#[tokio::test]
async fn two_transient_failures_surface_retrying_then_ready() {
    let fetcher = Arc::new(
        FakeStorage::new()
            .serving("https://cdn/b.obj", triangle_obj())
            .failing_first("https://cdn/b.obj", 2),
    );
    let selector = selector_with(fetcher.clone(), quick_policy());

    let states = drive(&selector, ModelReference::new("https://cdn/b.obj")).await;

    let labels: Vec<String> = states.iter().map(label).collect();
    assert_eq!(
        labels,
        vec![
            "idle",
            "loading",
            "retrying(1/2)",
            "loading",
            "retrying(2/2)",
            "loading",
            "ready"
        ]
    );
    assert_eq!(fetcher.calls(), 3);
}

#[tokio::test]
async fn unsupported_format_fails_without_a_single_fetch() {
    let fetcher = Arc::new(FakeStorage::new());
    let selector = selector_with(fetcher.clone(), quick_policy());

    let states = drive(&selector, ModelReference::new("https://cdn/c.stl")).await;

    match states.last().unwrap() {
        ViewState::Failed { kind, message } => {
            assert_eq!(*kind, FailureKind::Unsupported);
            assert!(message.contains("stl"), "message should name the format: {message}");
        }
        other => panic!("expected failed, got {}", other.name()),
    }
    assert_eq!(fetcher.calls(), 0);

    // A declared format takes the same path regardless of the extension.
    let states = drive(
        &selector,
        ModelReference::with_format("https://cdn/payload.bin", ModelFormat::Stl),
    )
    .await;
    assert!(matches!(
        states.last().unwrap(),
        ViewState::Failed { kind: FailureKind::Unsupported, .. }
    ));
    assert_eq!(fetcher.calls(), 0);
}

#[tokio::test]
async fn repeated_reference_is_served_from_the_cache() {
    let fetcher = Arc::new(FakeStorage::new().serving("https://cdn/a.glb", triangle_glb()));
    let selector = selector_with(fetcher.clone(), quick_policy());

    let first = drive(&selector, ModelReference::new("https://cdn/a.glb")).await;
    assert_eq!(fetcher.calls(), 1);

    let second = drive(&selector, ModelReference::new("https://cdn/a.glb")).await;
    assert_eq!(fetcher.calls(), 1, "cache hits never touch the network");

    // Same canonical handle both times, so nothing got re-normalized or
    // re-uploaded for the second view.
    let first_scene = ready_scene(first.last().unwrap());
    let second_scene = ready_scene(second.last().unwrap());
    assert!(Arc::ptr_eq(&first_scene, &second_scene));
}

#[tokio::test]
async fn exhausted_retries_fail_terminally_with_the_attempt_count() {
    let fetcher = Arc::new(FakeStorage::new());
    let selector = selector_with(fetcher.clone(), quick_policy());

    let states = drive(&selector, ModelReference::new("https://cdn/gone.glb")).await;

    match states.last().unwrap() {
        ViewState::Failed { kind, message } => {
            assert_eq!(*kind, FailureKind::Network);
            assert!(
                message.contains("failed to load after 2 retries"),
                "unexpected message: {message}"
            );
        }
        other => panic!("expected failed, got {}", other.name()),
    }
    assert_eq!(fetcher.calls(), 3);
}

#[tokio::test]
async fn malformed_payload_burns_its_attempts_as_parse_failures() {
    let fetcher = Arc::new(
        FakeStorage::new().serving("https://cdn/broken.glb", b"not a container".to_vec()),
    );
    let selector = selector_with(fetcher.clone(), quick_policy());

    let states = drive(&selector, ModelReference::new("https://cdn/broken.glb")).await;

    // A structurally corrupt file fails identically on every attempt; the
    // bound still applies and the terminal kind says parse, not network.
    assert!(matches!(
        states.last().unwrap(),
        ViewState::Failed { kind: FailureKind::Parse, .. }
    ));
    assert_eq!(fetcher.calls(), 3);
}

#[tokio::test]
async fn superseding_a_reference_silences_its_pending_retry() {
    let fetcher = Arc::new(FakeStorage::new().serving("https://cdn/new.glb", triangle_glb()));
    let policy = RetryPolicy {
        max_attempts: 2,
        base_delay: Duration::from_millis(100),
    };
    let selector = selector_with(fetcher.clone(), policy);

    // old.glb has no payload: the first attempt fails and the session parks
    // in its retry delay.
    let mut rx = selector.subscribe();
    selector.present(ModelReference::new("https://cdn/old.glb"));
    loop {
        rx.changed().await.expect("stream open");
        if matches!(*rx.borrow_and_update(), ViewState::Retrying { .. }) {
            break;
        }
    }

    let states = drive(&selector, ModelReference::new("https://cdn/new.glb")).await;
    assert!(matches!(states.last().unwrap(), ViewState::Ready { .. }));
    let failed = states
        .iter()
        .filter(|state| matches!(state, ViewState::Failed { .. }))
        .count();
    assert_eq!(failed, 0, "the superseded session must stay silent");

    // Let the old session's timer fire into the void, then check nothing
    // leaked into the stream and its retry never re-fetched.
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(matches!(*selector.subscribe().borrow(), ViewState::Ready { .. }));
    assert_eq!(fetcher.calls(), 2, "one failed fetch for old, one for new");
}

#[tokio::test]
async fn manual_retry_restarts_the_current_reference_with_a_fresh_budget() {
    // No retries: the single transient failure is terminal on the first run.
    let fetcher = Arc::new(
        FakeStorage::new()
            .serving("https://cdn/flaky.glb", triangle_glb())
            .failing_first("https://cdn/flaky.glb", 1),
    );
    let policy = RetryPolicy {
        max_attempts: 0,
        base_delay: Duration::from_millis(25),
    };
    let selector = selector_with(fetcher.clone(), policy);

    let states = drive(&selector, ModelReference::new("https://cdn/flaky.glb")).await;
    assert!(matches!(
        states.last().unwrap(),
        ViewState::Failed { kind: FailureKind::Network, .. }
    ));

    // The user presses retry: same reference, reset attempt counter.
    let mut rx = selector.subscribe();
    assert!(selector.retry());
    let terminal = loop {
        rx.changed().await.expect("stream open");
        let state = rx.borrow_and_update().clone();
        if state.is_terminal() {
            break state;
        }
    };
    assert!(matches!(terminal, ViewState::Ready { .. }));
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn retry_without_a_presented_reference_is_a_no_op() {
    let selector = selector_with(Arc::new(FakeStorage::new()), quick_policy());
    assert!(!selector.retry());
}

#[tokio::test]
async fn concurrent_loads_of_one_url_share_the_cached_handle() {
    let fetcher = Arc::new(FakeStorage::new().serving("https://cdn/a.glb", triangle_glb()));
    let cache = Arc::new(SceneCache::new());

    // Two selectors (two gallery views) race for the same asset.
    let left = ModelSelector::with_settings(
        fetcher.clone(),
        cache.clone(),
        quick_policy(),
        FitSettings::default(),
    );
    let right = ModelSelector::with_settings(
        fetcher.clone(),
        cache.clone(),
        quick_policy(),
        FitSettings::default(),
    );

    let (first, second) = tokio::join!(
        drive(&left, ModelReference::new("https://cdn/a.glb")),
        drive(&right, ModelReference::new("https://cdn/a.glb"))
    );

    let first_scene = ready_scene(first.last().unwrap());
    let second_scene = ready_scene(second.last().unwrap());
    assert!(
        Arc::ptr_eq(&first_scene, &second_scene),
        "the cache slot keeps one canonical graph"
    );
    assert_eq!(cache.len(), 1);
}
