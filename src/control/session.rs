//! The single mutable run session owned by the controller

use uuid::Uuid;

use crate::core::types::CollisionGeometry;

/// Where the session is in its single reach-and-grasp attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunState {
    /// Waiting for preconditions or for the next tick
    Idle,
    /// Aggregating geometry, resolving the target and planning
    Planning,
    /// Trajectories have been dispatched and are running
    Executing,
    /// The target was reached once; nothing further will run
    Done,
    /// A fatal error ended the session
    Aborted,
}

impl RunState {
    /// No further planning or execution can happen from this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Aborted)
    }
}

#[derive(Debug, Clone)]
pub struct RunSession {
    id: Uuid,
    target: String,
    state: RunState,
    last_geometries: Vec<CollisionGeometry>,
}

impl RunSession {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            target: target.into(),
            state: RunState::Idle,
            last_geometries: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// True once, and forever after, the target has been reached
    pub fn is_solved(&self) -> bool {
        self.state == RunState::Done
    }

    pub fn last_geometries(&self) -> &[CollisionGeometry] {
        &self.last_geometries
    }

    pub(crate) fn record_geometries(&mut self, geometries: Vec<CollisionGeometry>) {
        self.last_geometries = geometries;
    }

    /// Move to `next`, refusing to leave a terminal state
    pub(crate) fn transition(&mut self, next: RunState) {
        if self.state.is_terminal() {
            tracing::warn!(
                from = ?self.state,
                to = ?next,
                "ignoring transition out of terminal state"
            );
            return;
        }
        tracing::debug!(session = %self.id, from = ?self.state, to = ?next, "run state");
        self.state = next;
    }
}
