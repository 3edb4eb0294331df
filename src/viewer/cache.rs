use std::sync::Arc;

use dashmap::DashMap;

use crate::scene::SceneGraph;

/// Process-wide store of normalized scene graphs, keyed by source URL.
/// Entries live as long as the process: a gallery session revisits the same
/// handful of assets, and nothing here is ever evicted.
pub struct SceneCache {
    entries: DashMap<String, Arc<SceneGraph>>,
}

impl SceneCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_capacity(16),
        }
    }

    pub fn get(&self, url: &str) -> Option<Arc<SceneGraph>> {
        self.entries.get(url).map(|entry| entry.value().clone())
    }

    /// First writer wins: when two loads of the same URL race, the slot
    /// keeps whichever graph arrived first and both callers continue with
    /// that handle, so the renderer only ever sees one upload per URL.
    pub fn insert_if_absent(&self, url: &str, graph: Arc<SceneGraph>) -> Arc<SceneGraph> {
        self.entries.entry(url.to_owned()).or_insert(graph).clone()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl Default for SceneCache {
    fn default() -> Self {
        Self::new()
    }
}
