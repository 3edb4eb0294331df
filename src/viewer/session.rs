//! The observable side of a load session: the discriminated state the
//! presentation layer subscribes to, and the generation-guarded publisher
//! that keeps superseded sessions silent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use log::trace;
use tokio::sync::watch;

use crate::loader::LoadError;
use crate::scene::SceneGraph;
use crate::viewer::camera::CameraFrame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// No decoder exists; retrying cannot help and none is offered.
    Unsupported,
    Network,
    Parse,
    Decode,
}

impl FailureKind {
    pub fn from_load_error(error: &LoadError) -> Self {
        match error {
            LoadError::Network(_) => FailureKind::Network,
            LoadError::Parse(_) => FailureKind::Parse,
            LoadError::Decode(_) => FailureKind::Decode,
        }
    }
}

/// What the presentation layer sees. `Ready` hands out the shared normalized
/// graph (a borrow-style handle; the cache stays the owner) plus a camera
/// frame covering it.
#[derive(Debug, Clone)]
pub enum ViewState {
    Idle,
    Loading,
    Retrying { attempt: u32, max: u32 },
    Ready { scene: Arc<SceneGraph>, camera: CameraFrame },
    Failed { kind: FailureKind, message: String },
}

impl ViewState {
    pub fn name(&self) -> &'static str {
        match self {
            ViewState::Idle => "idle",
            ViewState::Loading => "loading",
            ViewState::Retrying { .. } => "retrying",
            ViewState::Ready { .. } => "ready",
            ViewState::Failed { .. } => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ViewState::Ready { .. } | ViewState::Failed { .. })
    }
}

/// Serializes the liveness check and the send, so a session that was
/// superseded between the two can never slip a stale state out.
pub(crate) struct StatePublisher {
    tx: watch::Sender<ViewState>,
    generation: AtomicU64,
    gate: Mutex<()>,
}

impl StatePublisher {
    pub fn new() -> (Arc<Self>, watch::Receiver<ViewState>) {
        let (tx, rx) = watch::channel(ViewState::Idle);
        (
            Arc::new(Self {
                tx,
                generation: AtomicU64::new(0),
                gate: Mutex::new(()),
            }),
            rx,
        )
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.tx.subscribe()
    }

    /// Starts a fresh session and returns its token. Everything spawned for
    /// earlier generations goes silent from here on.
    pub fn begin_session(&self) -> u64 {
        let _guard = self.gate.lock().expect("publisher gate");
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_live(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    /// Publishes unless the session is stale. Returns whether the state went
    /// out; a discarded publish is logged and otherwise a no-op.
    pub fn publish(&self, generation: u64, state: ViewState) -> bool {
        let _guard = self.gate.lock().expect("publisher gate");
        if self.generation.load(Ordering::SeqCst) != generation {
            trace!(
                "discarding state '{}' from superseded session {generation}",
                state.name()
            );
            return false;
        }
        let _ = self.tx.send(state);
        true
    }

    /// The reference-change / manual-retry reset: a fresh session starts
    /// from idle, but only if anything was ever published.
    pub fn publish_idle_if_dirty(&self, generation: u64) {
        let dirty = !matches!(*self.tx.borrow(), ViewState::Idle);
        if dirty {
            self.publish(generation, ViewState::Idle);
        }
    }
}
