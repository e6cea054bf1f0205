//! Trajectory execution contract
//!
//! Execution is action-style: submit a goal and block until it reaches a
//! terminal result. Arm and gripper are separate controller groups and are
//! always dispatched arm first.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::error::{ReachError, Result};
use crate::core::types::JointTrajectory;

/// Which trajectory controller a goal is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControllerGroup {
    Arm,
    Gripper,
}

impl ControllerGroup {
    /// Action namespace of this group's trajectory controller
    pub fn action_name(&self, manipulator: &str) -> String {
        match self {
            ControllerGroup::Arm => format!(
                "{}/effort_joint_trajectory_controller/follow_joint_trajectory",
                manipulator
            ),
            ControllerGroup::Gripper => format!(
                "{}/effort_finger_trajectory_controller/follow_joint_trajectory",
                manipulator
            ),
        }
    }
}

impl fmt::Display for ControllerGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerGroup::Arm => write!(f, "arm"),
            ControllerGroup::Gripper => write!(f, "gripper"),
        }
    }
}

/// Terminal result of one trajectory goal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Succeeded,
    Failed(String),
    TimedOut,
}

pub trait TrajectoryExecutor {
    /// Block until the execution servers are ready to accept goals
    fn wait_for_server(&mut self) -> Result<()> {
        Ok(())
    }

    /// Submit `trajectory` to `group` and block for the terminal result
    fn execute(&mut self, group: ControllerGroup, trajectory: &JointTrajectory) -> ExecutionOutcome;
}

impl<E: TrajectoryExecutor + ?Sized> TrajectoryExecutor for Box<E> {
    fn wait_for_server(&mut self) -> Result<()> {
        (**self).wait_for_server()
    }

    fn execute(
        &mut self,
        group: ControllerGroup,
        trajectory: &JointTrajectory,
    ) -> ExecutionOutcome {
        (**self).execute(group, trajectory)
    }
}

fn expect_success(group: ControllerGroup, outcome: ExecutionOutcome) -> Result<()> {
    match outcome {
        ExecutionOutcome::Succeeded => Ok(()),
        ExecutionOutcome::Failed(reason) => Err(ReachError::Execution { group, reason }),
        ExecutionOutcome::TimedOut => Err(ReachError::Execution {
            group,
            reason: "timed out".into(),
        }),
    }
}

/// Send the arm trajectory, wait for it, then send the gripper trajectory
///
/// A failed arm goal stops the sequence; the gripper goal is never sent.
pub fn dispatch_sequential<E: TrajectoryExecutor + ?Sized>(
    executor: &mut E,
    arm: &JointTrajectory,
    gripper: &JointTrajectory,
) -> Result<()> {
    tracing::info!(arm_points = arm.points.len(), "sending trajectory actions");

    let outcome = executor.execute(ControllerGroup::Arm, arm);
    expect_success(ControllerGroup::Arm, outcome)?;

    let outcome = executor.execute(ControllerGroup::Gripper, gripper);
    expect_success(ControllerGroup::Gripper, outcome)?;

    tracing::info!("trajectories complete");
    Ok(())
}
