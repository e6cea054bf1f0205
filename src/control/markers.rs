//! Debug display of goal and path points
//!
//! Purely a side effect; nothing reads markers back.

use crate::core::types::{Path, Vec3};

pub trait MarkerSink {
    /// Remove every marker from the previous tick
    fn clear(&mut self);

    fn mark_goal(&mut self, frame: &str, goal: Vec3);

    fn mark_path(&mut self, frame: &str, path: &Path);
}

/// Emits markers as debug-level log events
#[derive(Debug, Default)]
pub struct LogMarkers;

impl MarkerSink for LogMarkers {
    fn clear(&mut self) {
        tracing::trace!("markers cleared");
    }

    fn mark_goal(&mut self, frame: &str, goal: Vec3) {
        tracing::debug!(frame, x = goal.x, y = goal.y, z = goal.z, "goal marker");
    }

    fn mark_path(&mut self, frame: &str, path: &Path) {
        for (id, waypoint) in path.waypoints.iter().enumerate() {
            let p = waypoint.position;
            tracing::debug!(frame, id, x = p.x, y = p.y, z = p.z, "path marker");
        }
    }
}

/// Discards every marker
#[derive(Debug, Default)]
pub struct NoMarkers;

impl MarkerSink for NoMarkers {
    fn clear(&mut self) {}

    fn mark_goal(&mut self, _frame: &str, _goal: Vec3) {}

    fn mark_path(&mut self, _frame: &str, _path: &Path) {}
}
