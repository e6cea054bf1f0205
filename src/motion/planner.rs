//! Motion-plan request contract

use crate::core::types::{CollisionGeometry, Path, Pose, Vec3};

/// Everything the planner needs for one request
#[derive(Debug, Clone)]
pub struct PlanRequest<'a> {
    /// Current end-effector pose
    pub start: Pose,
    /// Point to reach
    pub goal: Vec3,
    /// Target identifier, so the planner can exclude the target's own boxes
    pub target: &'a str,
    /// Manipulator identity, so the planner can exclude its own links
    pub manipulator: &'a str,
    pub obstacles: &'a [CollisionGeometry],
}

/// Result of one planning call
#[derive(Debug, Clone, PartialEq)]
pub enum PlanOutcome {
    /// A path whose first waypoint is the start pose
    Found(Path),
    /// No feasible path this time; the reason is diagnostic only
    NotFound(String),
}

impl PlanOutcome {
    /// The path, if it passes `Path::check`
    pub fn valid_path(self) -> Option<Path> {
        match self {
            PlanOutcome::Found(path) if path.check() => Some(path),
            _ => None,
        }
    }
}

/// Collision-aware path planner
pub trait MotionPlanner {
    fn plan(&mut self, request: &PlanRequest<'_>) -> PlanOutcome;
}
