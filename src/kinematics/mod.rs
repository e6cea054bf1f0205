//! Manipulator kinematics contract
//!
//! The controller never inspects a solver; it only needs identity, joint
//! naming, the two fixed postures, forward kinematics at the current joint
//! state and a seeded inverse-kinematics solve.

use crate::core::types::{Pose, Quaternion, Vec3};

pub trait ManipulatorModel {
    /// Identity prefix shared by every entity and link of this manipulator
    fn name(&self) -> &str;

    fn joint_names(&self) -> &[String];

    fn finger_names(&self) -> &[String];

    fn joint_count(&self) -> usize {
        self.joint_names().len()
    }

    /// Joint positions of the "home" posture
    fn home_pose(&self) -> &[f64];

    /// Joint positions of the "init" (ready to approach) posture
    fn init_pose(&self) -> &[f64];

    /// End-effector pose at the current joint state
    fn solve_fk(&self) -> Pose;

    /// Joint solution placing the end effector at `position`/`orientation`
    ///
    /// The solver is local: `seed` is the starting guess, and the result
    /// should stay close to it. `None` means no solution was found.
    fn solve_ik(&self, position: Vec3, orientation: Quaternion, seed: &[f64]) -> Option<Vec<f64>>;

    /// Frame in which goal and path markers are expressed
    fn base_frame(&self) -> String {
        format!("{}_link_base", self.name())
    }
}
