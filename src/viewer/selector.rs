//! The façade the presentation layer drives: give it a model reference,
//! subscribe to the state stream, render what comes out.

use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use tokio::sync::watch;

use crate::format::{self, ModelReference};
use crate::io::common::fetcher::RawPayloadFetcher;
use crate::loader;
use crate::scene::SceneGraph;
use crate::viewer::cache::SceneCache;
use crate::viewer::camera::{self, FitSettings};
use crate::viewer::normalize;
use crate::viewer::retry::{run_with_retry, RetryOutcome, RetryPolicy};
use crate::viewer::session::{FailureKind, StatePublisher, ViewState};

/// Resolves the codec for a reference and drives the whole pipeline for it:
/// cache lookup, retry-wrapped load, normalization, cache insertion and
/// camera fit, surfaced as one observable state stream.
///
/// Presenting a new reference supersedes the running session; its in-flight
/// work keeps running but can never publish again.
pub struct ModelSelector {
    fetcher: Arc<dyn RawPayloadFetcher>,
    cache: Arc<SceneCache>,
    policy: RetryPolicy,
    fit: FitSettings,
    publisher: Arc<StatePublisher>,
    current: Mutex<Option<ModelReference>>,
}

impl ModelSelector {
    pub fn new(fetcher: Arc<dyn RawPayloadFetcher>, cache: Arc<SceneCache>) -> Self {
        Self::with_settings(fetcher, cache, RetryPolicy::default(), FitSettings::default())
    }

    pub fn with_settings(
        fetcher: Arc<dyn RawPayloadFetcher>,
        cache: Arc<SceneCache>,
        policy: RetryPolicy,
        fit: FitSettings,
    ) -> Self {
        let (publisher, _rx) = StatePublisher::new();
        Self {
            fetcher,
            cache,
            policy,
            fit,
            publisher,
            current: Mutex::new(None),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.publisher.subscribe()
    }

    /// Starts (or restarts) presentation of `reference`. Must run inside a
    /// tokio runtime; the load itself is spawned away from the caller.
    pub fn present(&self, reference: ModelReference) {
        let generation = self.publisher.begin_session();
        *self.current.lock().expect("current reference") = Some(reference.clone());
        self.publisher.publish_idle_if_dirty(generation);

        let resolved = format::resolve(&reference);
        debug!("presenting {} as {resolved}", reference.url);

        if !resolved.is_supported() {
            warn!("{}: unsupported format {resolved}", reference.url);
            self.publisher.publish(
                generation,
                ViewState::Failed {
                    kind: FailureKind::Unsupported,
                    message: format!("unsupported model format: {resolved}"),
                },
            );
            return;
        }

        if let Some(scene) = self.cache.get(&reference.url) {
            debug!("cache hit for {}", reference.url);
            let camera = camera::fit(&scene, self.fit);
            self.publisher
                .publish(generation, ViewState::Ready { scene, camera });
            return;
        }

        let publisher = self.publisher.clone();
        let fetcher = self.fetcher.clone();
        let cache = self.cache.clone();
        let policy = self.policy;
        let fit = self.fit;
        let url = reference.url.clone();

        tokio::spawn(async move {
            let max = policy.max_attempts;
            let outcome = run_with_retry(
                &policy,
                || publisher.is_live(generation),
                |state| {
                    publisher.publish(
                        generation,
                        ViewState::Retrying {
                            attempt: state.attempt,
                            max,
                        },
                    );
                },
                || {
                    publisher.publish(generation, ViewState::Loading);
                    loader::load_for_format(resolved, fetcher.clone(), &url)
                },
            )
            .await;

            match outcome {
                RetryOutcome::Superseded => {
                    debug!("superseded load of {url} discarded");
                }
                RetryOutcome::Completed { state, result: Ok(graph) } => {
                    let scene = finish_load(&cache, &url, graph);
                    let camera = camera::fit(&scene, fit);
                    info!(
                        "{url} ready after {} attempt(s): {:?}",
                        state.attempt + 1,
                        scene.stats()
                    );
                    publisher.publish(generation, ViewState::Ready { scene, camera });
                }
                RetryOutcome::Completed { state, result: Err(error) } => {
                    warn!("{url} failed terminally: {error}");
                    let message = if state.attempt > 0 {
                        format!("failed to load after {} retries: {error}", state.attempt)
                    } else {
                        format!("failed to load: {error}")
                    };
                    publisher.publish(
                        generation,
                        ViewState::Failed {
                            kind: FailureKind::from_load_error(&error),
                            message,
                        },
                    );
                }
            }
        });
    }

    /// The manual retry action offered next to a failure message: restarts
    /// the current reference with a fresh attempt budget.
    pub fn retry(&self) -> bool {
        let reference = self.current.lock().expect("current reference").clone();
        match reference {
            Some(reference) => {
                info!("manual retry for {}", reference.url);
                self.present(reference);
                true
            }
            None => false,
        }
    }
}

/// Normalize exactly once, then give the cache ownership. When a concurrent
/// load of the same URL won the slot, its graph is used and ours is dropped
/// before anything rendered it.
fn finish_load(cache: &SceneCache, url: &str, mut graph: SceneGraph) -> Arc<SceneGraph> {
    normalize::normalize(&mut graph);
    cache.insert_if_absent(url, Arc::new(graph))
}
