//! Fixed "home" and "init" postures
//!
//! Each posture is a one-point arm trajectory plus a one-point gripper
//! trajectory, dispatched arm first. The init aperture depends on whether
//! the session has already secured its object.

use std::time::Duration;

use crate::core::config::{GripperConfig, PostureConfig};
use crate::core::error::Result;
use crate::core::types::{JointTrajectory, TrajectoryPoint};
use crate::kinematics::ManipulatorModel;
use crate::motion::executor::{dispatch_sequential, TrajectoryExecutor};
use crate::motion::trajectory::gripper_trajectory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Posture {
    Home,
    Init,
}

pub struct PostureManager<'a> {
    posture: &'a PostureConfig,
    gripper: &'a GripperConfig,
    effort_ceiling: f64,
}

impl<'a> PostureManager<'a> {
    pub fn new(
        posture: &'a PostureConfig,
        gripper: &'a GripperConfig,
        effort_ceiling: f64,
    ) -> Self {
        Self {
            posture,
            gripper,
            effort_ceiling,
        }
    }

    /// Finger aperture for `posture`
    ///
    /// Home always closes the hand. Init opens it to approach, unless the
    /// object has already been grasped.
    pub fn aperture(&self, posture: Posture, solved: bool) -> f64 {
        match posture {
            Posture::Home => self.gripper.closed,
            Posture::Init if solved => self.gripper.closed,
            Posture::Init => self.gripper.open,
        }
    }

    /// Arm and gripper trajectories for `posture`
    pub fn trajectories<M: ManipulatorModel + ?Sized>(
        &self,
        model: &M,
        posture: Posture,
        solved: bool,
    ) -> (JointTrajectory, JointTrajectory) {
        let positions = match posture {
            Posture::Home => model.home_pose(),
            Posture::Init => model.init_pose(),
        };

        let mut arm = JointTrajectory::new(model.joint_names().to_vec());
        arm.points.push(TrajectoryPoint::hold(
            positions.to_vec(),
            self.effort_ceiling,
            Duration::from_secs_f64(self.posture.arm_time_secs),
        ));

        let gripper = gripper_trajectory(
            model,
            self.aperture(posture, solved),
            self.gripper.effort,
            self.posture.gripper_time_secs,
        );

        (arm, gripper)
    }

    /// Drive the arm, then the gripper, into `posture`
    pub fn go_to<M, E>(
        &self,
        model: &M,
        executor: &mut E,
        posture: Posture,
        solved: bool,
    ) -> Result<()>
    where
        M: ManipulatorModel + ?Sized,
        E: TrajectoryExecutor + ?Sized,
    {
        tracing::info!(?posture, "moving to posture");
        let (arm, gripper) = self.trajectories(model, posture, solved);
        dispatch_sequential(executor, &arm, &gripper)?;
        tracing::info!(?posture, manipulator = model.name(), "posture reached");
        Ok(())
    }
}
