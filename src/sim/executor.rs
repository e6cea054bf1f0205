//! Simulated trajectory controllers
//!
//! Goals complete instantly: an arm goal moves the shared joint state to the
//! trajectory's final point, a gripper goal stores the finger positions.
//! Every accepted goal is kept in a dispatch log.

use crate::core::types::JointTrajectory;
use crate::motion::executor::{ControllerGroup, ExecutionOutcome, TrajectoryExecutor};
use crate::sim::arm::JointState;

pub struct SimExecutor {
    manipulator: String,
    joints: JointState,
    gripper: Vec<f64>,
    log: Vec<(ControllerGroup, JointTrajectory)>,
    injected: Option<(ControllerGroup, ExecutionOutcome)>,
}

impl SimExecutor {
    pub fn new(manipulator: impl Into<String>, joints: JointState) -> Self {
        Self {
            manipulator: manipulator.into(),
            joints,
            gripper: Vec::new(),
            log: Vec::new(),
            injected: None,
        }
    }

    /// Answer the next goal sent to `group` with `outcome`
    pub fn inject_failure(&mut self, group: ControllerGroup, outcome: ExecutionOutcome) {
        self.injected = Some((group, outcome));
    }

    pub fn dispatched(&self) -> &[(ControllerGroup, JointTrajectory)] {
        &self.log
    }

    pub fn gripper_positions(&self) -> &[f64] {
        &self.gripper
    }
}

impl TrajectoryExecutor for SimExecutor {
    fn wait_for_server(&mut self) -> crate::core::error::Result<()> {
        for group in [ControllerGroup::Arm, ControllerGroup::Gripper] {
            tracing::info!(
                action = %group.action_name(&self.manipulator),
                "simulated trajectory controller ready"
            );
        }
        Ok(())
    }

    fn execute(
        &mut self,
        group: ControllerGroup,
        trajectory: &JointTrajectory,
    ) -> ExecutionOutcome {
        if !trajectory.is_well_formed() {
            return ExecutionOutcome::Failed("malformed trajectory".into());
        }
        if !trajectory.has_increasing_time() {
            return ExecutionOutcome::Failed("time_from_start must increase".into());
        }
        if matches!(&self.injected, Some((injected, _)) if *injected == group) {
            if let Some((_, outcome)) = self.injected.take() {
                tracing::debug!(%group, ?outcome, "injected outcome");
                return outcome;
            }
        }

        let Some(target) = trajectory.final_positions() else {
            return ExecutionOutcome::Failed("empty trajectory".into());
        };
        match group {
            ControllerGroup::Arm => {
                let mut joints = self.joints.lock().unwrap_or_else(|e| e.into_inner());
                if target.len() != joints.len() {
                    return ExecutionOutcome::Failed(format!(
                        "arm goal has {} joints, arm has {}",
                        target.len(),
                        joints.len()
                    ));
                }
                *joints = target.to_vec();
            }
            ControllerGroup::Gripper => self.gripper = target.to_vec(),
        }

        tracing::debug!(%group, points = trajectory.points.len(), "goal succeeded");
        self.log.push((group, trajectory.clone()));
        ExecutionOutcome::Succeeded
    }
}
