//! Last-seen set of scene entity names
//!
//! The scene-state feed replaces the snapshot wholesale; a run tick takes
//! its own handle at the start and never observes a later replacement.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Names of every entity currently known to the scene, in feed order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneSnapshot {
    pub names: Vec<String>,
}

impl SceneSnapshot {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for SceneSnapshot {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter.into_iter().map(Into::into).collect())
    }
}

/// Single-writer cache holding the most recent snapshot
///
/// `replace` swaps in a whole new snapshot. `current` hands out a shared
/// handle, so a reader keeps the exact snapshot it started with.
#[derive(Debug, Default)]
pub struct SceneCache {
    latest: Option<Arc<SceneSnapshot>>,
    updates: u64,
}

impl SceneCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached snapshot wholesale
    pub fn replace(&mut self, snapshot: SceneSnapshot) {
        tracing::trace!(entities = snapshot.len(), "scene snapshot replaced");
        self.latest = Some(Arc::new(snapshot));
        self.updates += 1;
    }

    /// Consistent view of the latest snapshot, if any has been received
    pub fn current(&self) -> Option<Arc<SceneSnapshot>> {
        self.latest.clone()
    }

    pub fn has_received(&self) -> bool {
        self.latest.is_some()
    }

    /// Number of snapshots received so far
    pub fn update_count(&self) -> u64 {
        self.updates
    }
}
